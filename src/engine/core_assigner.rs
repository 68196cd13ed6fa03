// ==========================================
// 月度轮值排班系统 - 核心类别级联分配引擎
// ==========================================
// 依据: Roster_Rules_v1.md - 6. 核心类别分配级联
// ==========================================
// 适用: SEQUENTIAL 且类别为核心类别的时段
// 级联: A-1 → A-2 → B-1 → B-2 → 兜底,命中即止
// 所有阶段实现同一 attempt(slot, 上下文) → Option<配对> 契约
// ==========================================

use crate::domain::schedule::DaySchedule;
use crate::domain::types::CategoryKey;
use crate::engine::context::AssignContext;
use crate::engine::priority::PriorityRanker;
use tracing::debug;

// ==========================================
// PairDecision - 级联产出的配对
// ==========================================

/// 一次成功的配对决定
#[derive(Debug, Clone)]
pub struct PairDecision {
    pub first: String,
    pub second: String,
    /// 其中消耗缺席者保障配额的 id
    pub fixed: Vec<String>,
    /// 命中的阶段名（日志/测试用）
    pub phase: &'static str,
}

// ==========================================
// CoreAssigner - 核心类别级联分配引擎
// ==========================================
pub struct CoreAssigner;

impl CoreAssigner {
    /// 对一个核心时段执行完整级联
    ///
    /// # 返回
    /// true: 已分配并完成记账; false: 各阶段均未命中,留给回填
    pub fn try_assign(
        ctx: &mut AssignContext,
        days: &mut [DaySchedule],
        day_idx: usize,
        slot_idx: usize,
    ) -> bool {
        let week = AssignContext::week_of(&days[day_idx]);
        let decision = {
            let day = &days[day_idx];
            let slot = &day.slots[slot_idx];
            let category = match slot.category_key.clone() {
                Some(c) if c.is_core() => c,
                _ => return false,
            };

            Self::phase_absentee(ctx, day, slot_idx, week, &category, AbsenteeStage::First)
                .or_else(|| {
                    Self::phase_absentee(
                        ctx,
                        day,
                        slot_idx,
                        week,
                        &category,
                        AbsenteeStage::Second,
                    )
                })
                .or_else(|| Self::phase_b1(ctx, day, slot_idx, week, &category))
                .or_else(|| Self::phase_b2(ctx, day, slot_idx, week, &category))
                .or_else(|| Self::phase_fallback(ctx, day, slot_idx, week, &category))
        };

        match decision {
            Some(pair) => {
                debug!(
                    date = %days[day_idx].date,
                    phase = pair.phase,
                    first = %pair.first,
                    second = %pair.second,
                    "核心时段分配命中"
                );
                let slot = &mut days[day_idx].slots[slot_idx];
                ctx.commit_pair(slot, week, &pair.first, &pair.second, &pair.fixed);
                true
            }
            None => false,
        }
    }

    // ==========================================
    // 阶段 A: 缺席者保障
    // ==========================================

    /// A-1: 保障次数为 0 的缺席者; A-2: 已兑现 1 次且目标为 2 的缺席者
    fn phase_absentee(
        ctx: &AssignContext,
        day: &DaySchedule,
        slot_idx: usize,
        week: u32,
        category: &CategoryKey,
        stage: AbsenteeStage,
    ) -> Option<PairDecision> {
        let slot = &day.slots[slot_idx];

        let candidates: Vec<String> = ctx
            .ids_of_type(slot.participant_type)
            .into_iter()
            .filter(|id| {
                let rec = match ctx.absentees.get(id) {
                    Some(r) => r,
                    None => return false,
                };
                let stage_ok = match stage {
                    AbsenteeStage::First => rec.fulfilled == 0,
                    AbsenteeStage::Second => rec.fulfilled == 1 && rec.target == 2,
                };
                stage_ok && !rec.fixed_weeks.contains(&week) && ctx.can_take(id, day, week)
            })
            .collect();

        let ranked = PriorityRanker::rank_deterministic(ctx, candidates, Some(category));
        let absentee = ranked.into_iter().next()?;

        let partner = Self::pick_partner(ctx, day, week, category, &absentee)?;

        // 搭档若也是欠保障的缺席者且本周未用于保障,同样消耗配额
        let mut fixed = vec![absentee.clone()];
        if Self::consumes_quota(ctx, &partner, week) {
            fixed.push(partner.clone());
        }

        Some(PairDecision {
            first: absentee,
            second: partner,
            fixed,
            phase: match stage {
                AbsenteeStage::First => "A-1",
                AbsenteeStage::Second => "A-2",
            },
        })
    }

    /// 缺席者搭档选择: 同分部全池按比较器排名,优先未欠保障者
    fn pick_partner(
        ctx: &AssignContext,
        day: &DaySchedule,
        week: u32,
        category: &CategoryKey,
        chosen: &str,
    ) -> Option<String> {
        let chosen_gender = ctx.gender_of(chosen)?;
        let slot_type = ctx.member(chosen)?.participant_type;

        let pool: Vec<String> = ctx
            .ids_of_type(slot_type)
            .into_iter()
            .filter(|id| {
                id != chosen
                    && ctx.gender_of(id) == Some(chosen_gender)
                    && ctx.can_take(id, day, week)
            })
            .collect();
        let ranked = PriorityRanker::rank_deterministic(ctx, pool, Some(category));

        ranked
            .iter()
            .find(|id| !ctx.is_owing_absentee(id.as_str()))
            .or_else(|| ranked.first())
            .cloned()
    }

    // ==========================================
    // 阶段 B-1: 预洗牌候选池
    // ==========================================

    /// 池序扫描,取前两个性别相同的可用成员
    fn phase_b1(
        ctx: &AssignContext,
        day: &DaySchedule,
        slot_idx: usize,
        week: u32,
        category: &CategoryKey,
    ) -> Option<PairDecision> {
        let slot = &day.slots[slot_idx];
        let pool = ctx.b1_pools.get(&slot.participant_type)?;

        let eligible: Vec<String> = pool
            .iter()
            .filter(|id| {
                let id = id.as_str();
                ctx.ledger.category_count_of(id, category) == 0
                    && !ctx.is_absentee(id)
                    && ctx.can_take(id, day, week)
            })
            .cloned()
            .collect();

        let (first, second) = ctx.first_compatible_pair(&eligible)?;
        Some(PairDecision {
            first,
            second,
            fixed: Vec::new(),
            phase: "B-1",
        })
    }

    // ==========================================
    // 阶段 B-2: 常规成员第二次核心
    // ==========================================

    /// 仅当本分部所有常规成员都已有第一次核心分配且核心时段仍有缺口时激活
    fn phase_b2(
        ctx: &AssignContext,
        day: &DaySchedule,
        slot_idx: usize,
        week: u32,
        category: &CategoryKey,
    ) -> Option<PairDecision> {
        let slot = &day.slots[slot_idx];

        let regulars: Vec<String> = ctx
            .ids_of_type(slot.participant_type)
            .into_iter()
            .filter(|id| !ctx.is_absentee(id))
            .collect();

        // 激活检查只看常规成员;缺席者经 A 阶段进入核心时段,此处刻意不计
        if regulars
            .iter()
            .any(|id| ctx.ledger.category_count_of(id, category) == 0)
        {
            return None;
        }
        if !ctx
            .quotas
            .get(&slot.participant_type)
            .map(|q| q.remaining())
            .unwrap_or(false)
        {
            return None;
        }

        let candidates: Vec<String> = regulars
            .into_iter()
            .filter(|id| {
                ctx.ledger.category_count_of(id, category) == 1 && ctx.can_take(id, day, week)
            })
            .collect();

        let ranked = PriorityRanker::rank_deterministic(ctx, candidates, Some(category));
        let (first, second) = ctx.first_compatible_pair(&ranked)?;
        Some(PairDecision {
            first,
            second,
            fixed: Vec::new(),
            phase: "B-2",
        })
    }

    // ==========================================
    // 兜底阶段
    // ==========================================

    /// 全分部池,剔除超限/周阻断/已满保障的缺席者;欠保障缺席者入选则顺带计保障
    fn phase_fallback(
        ctx: &AssignContext,
        day: &DaySchedule,
        slot_idx: usize,
        week: u32,
        category: &CategoryKey,
    ) -> Option<PairDecision> {
        let slot = &day.slots[slot_idx];

        let pool: Vec<String> = ctx
            .ids_of_type(slot.participant_type)
            .into_iter()
            .filter(|id| {
                if let Some(rec) = ctx.absentees.get(id) {
                    if !rec.owing() {
                        return false;
                    }
                }
                ctx.can_take(id, day, week)
            })
            .collect();

        let ranked = PriorityRanker::rank_deterministic(ctx, pool, Some(category));
        let (first, second) = ctx.first_compatible_pair(&ranked)?;

        let mut fixed = Vec::new();
        for id in [&first, &second] {
            if Self::consumes_quota(ctx, id, week) {
                fixed.push(id.clone());
            }
        }

        Some(PairDecision {
            first,
            second,
            fixed,
            phase: "FALLBACK",
        })
    }

    /// 欠保障缺席者且该周尚未用于保障分配
    fn consumes_quota(ctx: &AssignContext, id: &str, week: u32) -> bool {
        ctx.absentees
            .get(id)
            .map(|rec| rec.owing() && !rec.fixed_weeks.contains(&week))
            .unwrap_or(false)
    }
}

/// 缺席者阶段标记
#[derive(Debug, Clone, Copy)]
enum AbsenteeStage {
    First,
    Second,
}
