// ==========================================
// 月度轮值排班系统 - 优先级排序引擎
// ==========================================
// 依据: Roster_Rules_v1.md - 5. 优先级比较器
// ==========================================
// 排序键 (升序,先出现的键先比较):
// 1) 本次运行该类别次数 - 少者优先
// 2) 跨类别偏好分 - 高者优先
//    +1: 上月已完成本分部核心 且 本时段不是该核心 (推向其他时段)
//    -1: 上月已完成本分部核心 且 本时段正是该核心 (降低重复核心)
//     0: 其他
// 3) 上月总次数 - 少者优先
// 4) 本次运行该类别次数(无类别时取总次数) - 少者优先
// 5) 决胜: id 升序(确定性阶段) 或 随机(随机阶段)
// ==========================================

use crate::domain::types::CategoryKey;
use crate::engine::context::AssignContext;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

// ==========================================
// PriorityRanker - 优先级排序引擎
// ==========================================
pub struct PriorityRanker;

impl PriorityRanker {
    /// 跨类别偏好分
    pub fn cross_preference(
        ctx: &AssignContext,
        id: &str,
        category: Option<&CategoryKey>,
    ) -> i32 {
        let member = match ctx.member(id) {
            Some(m) => m,
            None => return 0,
        };
        let own_core = member.participant_type.core_category();
        if ctx.prior_count(id, own_core.as_str()) == 0 {
            return 0;
        }
        match category {
            Some(key) if *key == own_core => -1,
            _ => 1,
        }
    }

    /// 排序键元组（升序比较；偏好分取负使高分靠前）
    pub fn sort_key(
        ctx: &AssignContext,
        id: &str,
        category: Option<&CategoryKey>,
    ) -> (u32, i32, u32, u32) {
        let category_count = category
            .map(|key| ctx.ledger.category_count_of(id, key))
            .unwrap_or(0);
        let cross = Self::cross_preference(ctx, id, category);
        let prior_total = ctx.prior_total(id);
        let category_or_total = match category {
            Some(key) => ctx.ledger.category_count_of(id, key),
            None => ctx.ledger.total_of(id),
        };
        (category_count, -cross, prior_total, category_or_total)
    }

    /// 确定性排名：比较键 + id 升序决胜
    pub fn rank_deterministic(
        ctx: &AssignContext,
        mut pool: Vec<String>,
        category: Option<&CategoryKey>,
    ) -> Vec<String> {
        pool.sort_by(|a, b| {
            Self::sort_key(ctx, a, category)
                .cmp(&Self::sort_key(ctx, b, category))
                .then_with(|| a.cmp(b))
        });
        pool
    }

    /// 随机决胜排名：先洗牌再稳定排序,同键者保持洗牌顺序
    pub fn rank_random(
        ctx: &AssignContext,
        rng: &mut ChaCha8Rng,
        mut pool: Vec<String>,
        category: Option<&CategoryKey>,
    ) -> Vec<String> {
        pool.shuffle(rng);
        pool.sort_by(|a, b| {
            Self::sort_key(ctx, a, category).cmp(&Self::sort_key(ctx, b, category))
        });
        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{Gender, ParticipantType};
    use crate::engine::context::RosterMember;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn ctx_with_prior(prior: HashMap<String, HashMap<String, u32>>) -> AssignContext {
        let members = vec![
            RosterMember {
                id: "a".to_string(),
                name: "甲".to_string(),
                participant_type: ParticipantType::Elementary,
                gender: Gender::Male,
            },
            RosterMember {
                id: "b".to_string(),
                name: "乙".to_string(),
                participant_type: ParticipantType::Elementary,
                gender: Gender::Male,
            },
            RosterMember {
                id: "c".to_string(),
                name: "丙".to_string(),
                participant_type: ParticipantType::Elementary,
                gender: Gender::Female,
            },
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        AssignContext::build(members, prior, &[], &[], &mut rng)
    }

    fn prior_entry(id: &str, key: &str, count: u32) -> (String, HashMap<String, u32>) {
        let mut inner = HashMap::new();
        inner.insert(key.to_string(), count);
        (id.to_string(), inner)
    }

    #[test]
    fn test_cross_preference_scores() {
        let prior: HashMap<_, _> =
            [prior_entry("a", "elementary-core", 1)].into_iter().collect();
        let ctx = ctx_with_prior(prior);
        let core = CategoryKey::elementary_core();
        let other = CategoryKey::new("praise-team");

        // 上月已完成本分部核心: 核心时段 -1,其他时段 +1
        assert_eq!(PriorityRanker::cross_preference(&ctx, "a", Some(&core)), -1);
        assert_eq!(PriorityRanker::cross_preference(&ctx, "a", Some(&other)), 1);
        assert_eq!(PriorityRanker::cross_preference(&ctx, "a", None), 1);
        // 上月未完成: 0
        assert_eq!(PriorityRanker::cross_preference(&ctx, "b", Some(&core)), 0);
    }

    #[test]
    fn test_rank_prefers_fewer_prior_totals() {
        let prior: HashMap<_, _> = [
            prior_entry("a", "total", 3),
            prior_entry("b", "total", 1),
        ]
        .into_iter()
        .collect();
        let ctx = ctx_with_prior(prior);

        let ranked = PriorityRanker::rank_deterministic(
            &ctx,
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            None,
        );
        // c 上月 0 次最优,其次 b,最后 a
        assert_eq!(ranked, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_repeat_core_deprioritized() {
        // a 上月已完成核心,本时段为同一核心 → 排到 b 之后
        let prior: HashMap<_, _> =
            [prior_entry("a", "elementary-core", 1)].into_iter().collect();
        let ctx = ctx_with_prior(prior);
        let core = CategoryKey::elementary_core();

        let ranked = PriorityRanker::rank_deterministic(
            &ctx,
            vec!["a".to_string(), "b".to_string()],
            Some(&core),
        );
        assert_eq!(ranked, vec!["b", "a"]);
    }

    #[test]
    fn test_rank_random_is_seeded() {
        let ctx = ctx_with_prior(HashMap::new());
        let pool = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let mut rng1 = ChaCha8Rng::seed_from_u64(42);
        let mut rng2 = ChaCha8Rng::seed_from_u64(42);
        let r1 = PriorityRanker::rank_random(&ctx, &mut rng1, pool.clone(), None);
        let r2 = PriorityRanker::rank_random(&ctx, &mut rng2, pool, None);
        assert_eq!(r1, r2);
    }
}
