// ==========================================
// 月度轮值排班系统 - 引擎编排器
// ==========================================
// 依据: Roster_Rules_v1.md - 4. 分配主流程
// 用途: 协调展开/日循环/回填三连扫的执行顺序,最后一次性落库
// ==========================================
// 并发模型: 单线程同步计算,仅首尾两处存储协作方调用是异步边界;
// 同一月份的重复并发调用由调用方串行化
// ==========================================

use crate::domain::schedule::{CategoryCountRecord, DaySchedule, WeeklyTemplate};
use crate::domain::types::{Gender, SelectionMode};
use crate::engine::backfill::BackfillSweeper;
use crate::engine::calendar::CalendarExpander;
use crate::engine::context::{AssignContext, RosterMember};
use crate::engine::core_assigner::CoreAssigner;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::random_assigner::RandomAssigner;
use crate::storage::{prior_month, RosterStore};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};

// ==========================================
// MonthScheduleResult - 排班结果
// ==========================================

#[derive(Debug, Clone)]
pub struct MonthScheduleResult {
    pub year: i32,
    pub month: u32,
    pub days: Vec<DaySchedule>,
    /// 本月类别次数快照（已随结果落库,成为下月历史输入）
    pub category_counts: Vec<CategoryCountRecord>,
    /// 回填后仍为空的时段数（软结果）
    pub unfilled_slots: u32,
}

// ==========================================
// RosterOrchestrator - 引擎编排器
// ==========================================

pub struct RosterOrchestrator<S>
where
    S: RosterStore,
{
    store: Arc<S>,
    template: WeeklyTemplate,
}

impl<S> RosterOrchestrator<S>
where
    S: RosterStore,
{
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - store: 存储协作方
    /// - template: 固定周模板
    pub fn new(store: Arc<S>, template: WeeklyTemplate) -> Self {
        Self { store, template }
    }

    /// 执行整月排班
    ///
    /// # 参数
    /// - year / month: 目标年月
    /// - seed: 随机源种子（同种子同输入 → 同结果）
    ///
    /// # 流程
    /// 1. 加载名册 + 上月快照 + 上月缺席名单
    /// 2. 前置校验（名册非空、性别齐全）
    /// 3. 周模板展开
    /// 4. 日循环: 核心时段走级联,随机时段走公平随机
    /// 5. 回填三连扫
    /// 6. 一次性落库（排班结果 + 类别次数快照）
    pub async fn run_month(
        &self,
        year: i32,
        month: u32,
        seed: u64,
    ) -> EngineResult<MonthScheduleResult> {
        info!(year, month, seed, "开始执行月度排班");

        // ==========================================
        // 步骤1: 加载输入
        // ==========================================
        let participants = self.store.list_participants().await?;
        let (prior_year, prior_month_num) = prior_month(year, month);
        let prior_counts = self
            .store
            .category_counts(prior_year, prior_month_num)
            .await?;
        let absentee_ids = self.store.absentees(prior_year, prior_month_num).await?;

        info!(
            participants_count = participants.len(),
            absentees_count = absentee_ids.len(),
            prior_year,
            prior_month = prior_month_num,
            "输入加载完成"
        );

        // ==========================================
        // 步骤2: 前置校验
        // ==========================================
        let active: Vec<_> = participants.iter().filter(|p| p.active).collect();
        if active.is_empty() {
            return Err(EngineError::EmptyRoster);
        }
        let mut members = Vec::with_capacity(active.len());
        for participant in active {
            let gender: Gender = match participant.gender {
                Some(g) => g,
                None => {
                    return Err(EngineError::MissingGender {
                        participant_id: participant.id.clone(),
                        name: participant.name.clone(),
                    })
                }
            };
            members.push(RosterMember::from_participant(participant, gender));
        }

        // ==========================================
        // 步骤3: 周模板展开
        // ==========================================
        let mut days = CalendarExpander::expand_month(year, month, &self.template);
        debug!(days_count = days.len(), "周模板展开完成");

        // ==========================================
        // 步骤4: 上下文构建 + 日循环
        // ==========================================
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut ctx =
            AssignContext::build(members, prior_counts, &absentee_ids, &days, &mut rng);

        for day_idx in 0..days.len() {
            let weekday = days[day_idx].weekday;
            let modes: Vec<SelectionMode> = self
                .template
                .slots_for(weekday)
                .map(|t| t.selection_mode)
                .collect();

            for slot_idx in 0..days[day_idx].slots.len() {
                let mode = modes
                    .get(slot_idx)
                    .copied()
                    .unwrap_or(SelectionMode::Sequential);
                let is_core = days[day_idx].slots[slot_idx]
                    .category_key
                    .as_ref()
                    .map(|c| c.is_core())
                    .unwrap_or(false);

                match mode {
                    SelectionMode::Sequential if is_core => {
                        CoreAssigner::try_assign(&mut ctx, &mut days, day_idx, slot_idx);
                    }
                    SelectionMode::Random => {
                        RandomAssigner::try_assign(
                            &mut ctx, &mut rng, &mut days, day_idx, slot_idx,
                        );
                    }
                    // 非核心顺序时段主循环不处理,交给回填
                    SelectionMode::Sequential => {}
                }
            }
        }

        // ==========================================
        // 步骤5: 回填三连扫
        // ==========================================
        BackfillSweeper::run_all(&mut ctx, &mut rng, &mut days);

        // ==========================================
        // 步骤6: 统计 + 一次性落库
        // ==========================================
        let unfilled_slots = days
            .iter()
            .flat_map(|d| d.slots.iter())
            .filter(|s| s.is_empty())
            .count() as u32;
        if unfilled_slots > 0 {
            warn!(unfilled_slots, "回填后仍有空时段（软结果,不视为错误）");
        }

        let category_counts = ctx.ledger.snapshot();

        self.store.save_schedule(year, month, &days).await?;
        self.store
            .save_category_counts(year, month, &category_counts)
            .await?;

        info!(
            year,
            month,
            days_count = days.len(),
            snapshot_rows = category_counts.len(),
            unfilled_slots,
            "月度排班完成并落库"
        );

        Ok(MonthScheduleResult {
            year,
            month,
            days,
            category_counts,
            unfilled_slots,
        })
    }
}
