// ==========================================
// 月度轮值排班系统 - 回填引擎
// ==========================================
// 依据: Roster_Rules_v1.md - 8. 回填三连扫
// ==========================================
// 日循环结束后严格按序执行:
// 1) 缺席者非核心补位
// 2) 最低覆盖配对 (C 步)
// 3) 剩余空时段终扫 (D 步)
// 扫完仍空的时段是上报结果,不是错误
// ==========================================

use crate::domain::schedule::DaySchedule;
use crate::engine::context::AssignContext;
use crate::engine::priority::PriorityRanker;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

// ==========================================
// BackfillSweeper - 回填引擎
// ==========================================
pub struct BackfillSweeper;

impl BackfillSweeper {
    /// 按序执行三次回填
    pub fn run_all(ctx: &mut AssignContext, rng: &mut ChaCha8Rng, days: &mut [DaySchedule]) {
        Self::absentee_top_up(ctx, days);
        Self::minimum_coverage(ctx, rng, days);
        Self::final_fill(ctx, rng, days);
    }

    // ==========================================
    // 扫描 1: 缺席者非核心补位
    // ==========================================

    /// 仍欠保障的缺席者按日历序找第一个可用的非核心空时段
    pub fn absentee_top_up(ctx: &mut AssignContext, days: &mut [DaySchedule]) {
        let mut absentee_ids: Vec<String> = ctx.absentees.keys().cloned().collect();
        absentee_ids.sort();

        for id in absentee_ids {
            loop {
                let rec = match ctx.absentees.get(&id) {
                    Some(r) => r,
                    None => break,
                };
                if !rec.owing() || ctx.ledger.total_of(&id) >= ctx.cap {
                    break;
                }

                match Self::find_top_up_slot(ctx, days, &id) {
                    Some((day_idx, slot_idx, partner)) => {
                        let week = AssignContext::week_of(&days[day_idx]);
                        debug!(
                            absentee = %id,
                            date = %days[day_idx].date,
                            partner = %partner,
                            "缺席者非核心补位命中"
                        );
                        let slot = &mut days[day_idx].slots[slot_idx];
                        ctx.commit_pair(slot, week, &id, &partner, &[id.clone()]);
                    }
                    None => break,
                }
            }
        }
    }

    /// 日历序查找第一个 类型/当日/周 兼容且有同性别搭档的非核心空时段
    fn find_top_up_slot(
        ctx: &AssignContext,
        days: &[DaySchedule],
        id: &str,
    ) -> Option<(usize, usize, String)> {
        let member = ctx.member(id)?;
        let rec = ctx.absentees.get(id)?;

        for (day_idx, day) in days.iter().enumerate() {
            let week = AssignContext::week_of(day);
            if !ctx.can_take(id, day, week) || rec.fixed_weeks.contains(&week) {
                continue;
            }
            for (slot_idx, slot) in day.slots.iter().enumerate() {
                if !slot.is_empty()
                    || slot.participant_type != member.participant_type
                    || slot.category_key.as_ref().map(|c| c.is_core()).unwrap_or(false)
                {
                    continue;
                }

                let pool: Vec<String> = ctx
                    .ids_of_type(member.participant_type)
                    .into_iter()
                    .filter(|pid| {
                        pid != id
                            && ctx.gender_of(pid) == Some(member.gender)
                            && ctx.can_take(pid, day, week)
                    })
                    .collect();
                let ranked = PriorityRanker::rank_deterministic(
                    ctx,
                    pool,
                    slot.category_key.as_ref(),
                );
                let partner = ranked
                    .iter()
                    .find(|pid| !ctx.is_owing_absentee(pid.as_str()))
                    .or_else(|| ranked.first());

                if let Some(partner) = partner {
                    return Some((day_idx, slot_idx, partner.clone()));
                }
            }
        }
        None
    }

    // ==========================================
    // 扫描 2: 最低覆盖配对 (C 步)
    // ==========================================

    /// 总数 < 2 者按 (上月总数, id) 排序,相邻同性别同分部贪心配对,
    /// 洗牌后的空时段中为每对找第一个双方可用的时段
    pub fn minimum_coverage(ctx: &mut AssignContext, rng: &mut ChaCha8Rng, days: &mut [DaySchedule]) {
        let mut under_served: Vec<String> = ctx
            .members()
            .iter()
            .filter(|m| {
                let total = ctx.ledger.total_of(&m.id);
                total < 2 && total < ctx.cap
            })
            .map(|m| m.id.clone())
            .collect();
        under_served.sort_by(|a, b| {
            ctx.prior_total(a)
                .cmp(&ctx.prior_total(b))
                .then_with(|| a.cmp(b))
        });

        // 相邻贪心配对,每人至多用一次
        let mut used = vec![false; under_served.len()];
        let mut pairs: Vec<(String, String)> = Vec::new();
        for i in 0..under_served.len() {
            if used[i] {
                continue;
            }
            let (gender_i, type_i) = match ctx.member(&under_served[i]) {
                Some(m) => (m.gender, m.participant_type),
                None => continue,
            };
            for j in (i + 1)..under_served.len() {
                if used[j] {
                    continue;
                }
                let compatible = ctx
                    .member(&under_served[j])
                    .map(|m| m.gender == gender_i && m.participant_type == type_i)
                    .unwrap_or(false);
                if compatible {
                    used[i] = true;
                    used[j] = true;
                    pairs.push((under_served[i].clone(), under_served[j].clone()));
                    break;
                }
            }
        }

        let mut empties = Self::empty_slots(days);
        empties.shuffle(rng);

        for (first, second) in pairs {
            let slot_type = match ctx.member(&first) {
                Some(m) => m.participant_type,
                None => continue,
            };
            let found = empties.iter().position(|&(day_idx, slot_idx)| {
                let day = &days[day_idx];
                let slot = &day.slots[slot_idx];
                let week = AssignContext::week_of(day);
                slot.is_empty()
                    && slot.participant_type == slot_type
                    && ctx.can_take(&first, day, week)
                    && ctx.can_take(&second, day, week)
            });
            if let Some(pos) = found {
                let (day_idx, slot_idx) = empties.remove(pos);
                let week = AssignContext::week_of(&days[day_idx]);
                debug!(
                    date = %days[day_idx].date,
                    first = %first,
                    second = %second,
                    "最低覆盖配对命中"
                );
                let slot = &mut days[day_idx].slots[slot_idx];
                ctx.commit_pair(slot, week, &first, &second, &[]);
            }
        }
    }

    // ==========================================
    // 扫描 3: 剩余空时段终扫 (D 步)
    // ==========================================

    /// 剩余空时段洗牌后逐个尝试:
    /// 可用池按本次总数升序随机决胜,取首位再找同性别搭档
    pub fn final_fill(ctx: &mut AssignContext, rng: &mut ChaCha8Rng, days: &mut [DaySchedule]) {
        let mut empties = Self::empty_slots(days);
        empties.shuffle(rng);

        for (day_idx, slot_idx) in empties {
            let week = AssignContext::week_of(&days[day_idx]);
            let pair = {
                let day = &days[day_idx];
                let slot = &day.slots[slot_idx];

                let mut pool: Vec<String> = ctx
                    .ids_of_type(slot.participant_type)
                    .into_iter()
                    .filter(|id| ctx.can_take(id, day, week))
                    .collect();
                pool.shuffle(rng);
                pool.sort_by_key(|id| ctx.ledger.total_of(id));

                Self::lead_and_partner(ctx, &pool)
            };

            if let Some((first, second)) = pair {
                debug!(
                    date = %days[day_idx].date,
                    first = %first,
                    second = %second,
                    "终扫填充命中"
                );
                let slot = &mut days[day_idx].slots[slot_idx];
                ctx.commit_pair(slot, week, &first, &second, &[]);
            }
        }
    }

    /// 池首为主选,其后第一个同性别者为搭档
    fn lead_and_partner(ctx: &AssignContext, pool: &[String]) -> Option<(String, String)> {
        let lead = pool.first()?;
        let lead_gender = ctx.gender_of(lead)?;
        let partner = pool
            .iter()
            .skip(1)
            .find(|id| ctx.gender_of(id.as_str()) == Some(lead_gender))?;
        Some((lead.clone(), partner.clone()))
    }

    /// 所有仍为空的 (day_idx, slot_idx)
    fn empty_slots(days: &[DaySchedule]) -> Vec<(usize, usize)> {
        let mut empties = Vec::new();
        for (day_idx, day) in days.iter().enumerate() {
            for (slot_idx, slot) in day.slots.iter().enumerate() {
                if slot.is_empty() {
                    empties.push((day_idx, slot_idx));
                }
            }
        }
        empties
    }
}
