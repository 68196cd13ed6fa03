// ==========================================
// 月度轮值排班系统 - 随机时段分配引擎
// ==========================================
// 依据: Roster_Rules_v1.md - 7. 随机公平分配
// ==========================================
// 适用: RANDOM 模式时段
// 规则: 本次运行零分配者绝对优先,其余按比较器随机决胜;
//       非缺席可用者 ≥2 时缺席者整体出局(留给核心/补位)
// ==========================================

use crate::domain::schedule::DaySchedule;
use crate::engine::context::AssignContext;
use crate::engine::priority::PriorityRanker;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

// ==========================================
// RandomAssigner - 随机时段分配引擎
// ==========================================
pub struct RandomAssigner;

impl RandomAssigner {
    /// 对一个随机时段执行分配
    ///
    /// # 返回
    /// true: 已分配并完成记账; false: 无可用同性别配对,留给回填
    pub fn try_assign(
        ctx: &mut AssignContext,
        rng: &mut ChaCha8Rng,
        days: &mut [DaySchedule],
        day_idx: usize,
        slot_idx: usize,
    ) -> bool {
        let week = AssignContext::week_of(&days[day_idx]);
        let pair = {
            let day = &days[day_idx];
            let slot = &day.slots[slot_idx];

            let mut pool: Vec<String> = ctx
                .ids_of_type(slot.participant_type)
                .into_iter()
                .filter(|id| ctx.can_take(id, day, week))
                .collect();

            // 非缺席可用者足够时,缺席者不占随机时段
            let regular_count = pool.iter().filter(|id| !ctx.is_absentee(id.as_str())).count();
            if regular_count >= 2 {
                pool.retain(|id| !ctx.is_absentee(id));
            }

            let ranked = Self::rank_pool(ctx, rng, pool, day, slot_idx);
            Self::scan_for_pair(ctx, &ranked)
        };

        match pair {
            Some((first, second)) => {
                debug!(
                    date = %days[day_idx].date,
                    first = %first,
                    second = %second,
                    "随机时段分配命中"
                );
                let slot = &mut days[day_idx].slots[slot_idx];
                ctx.commit_pair(slot, week, &first, &second, &[]);
                true
            }
            None => false,
        }
    }

    /// 排序: 零分配者恒在前,其后按比较器随机决胜
    fn rank_pool(
        ctx: &AssignContext,
        rng: &mut ChaCha8Rng,
        pool: Vec<String>,
        day: &DaySchedule,
        slot_idx: usize,
    ) -> Vec<String> {
        let category = day.slots[slot_idx].category_key.clone();
        let mut ranked = PriorityRanker::rank_random(ctx, rng, pool, category.as_ref());
        // 稳定排序: 同组内保持随机决胜后的顺序
        ranked.sort_by_key(|id| u32::from(ctx.ledger.total_of(id) > 0));
        ranked
    }

    /// 先按排序相邻扫描,无相邻同性别对时退化为全量扫描
    fn scan_for_pair(ctx: &AssignContext, ranked: &[String]) -> Option<(String, String)> {
        for window in ranked.windows(2) {
            if ctx.gender_of(&window[0]).is_some()
                && ctx.gender_of(&window[0]) == ctx.gender_of(&window[1])
            {
                return Some((window[0].clone(), window[1].clone()));
            }
        }
        ctx.first_compatible_pair(ranked)
    }
}
