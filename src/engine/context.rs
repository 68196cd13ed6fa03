// ==========================================
// 月度轮值排班系统 - 分配上下文
// ==========================================
// 依据: Roster_Rules_v1.md - 4. 分配主流程
// ==========================================
// 职责: 承载一次运行的全部工作集
// - 校验后的名册视图（性别已非空）
// - 公平性台账 / 缺席者保障记录 / 核心时段配额
// - 上月快照与 B-1 预洗牌候选池
// 各阶段引擎共享同一上下文,逐阶段可变传递
// ==========================================

use crate::domain::participant::Participant;
use crate::domain::schedule::{DaySchedule, SlotAssignment};
use crate::domain::types::{Gender, ParticipantType, TOTAL_KEY};
use crate::engine::calendar::CalendarExpander;
use crate::engine::ledger::{
    AbsenteeRecord, CoreSlotQuota, FairnessLedger, MAX_ASSIGNMENTS_PER_MONTH,
};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

// ==========================================
// RosterMember - 校验后的名册成员
// ==========================================

/// 通过前置校验的启用参与者（性别保证存在）
#[derive(Debug, Clone)]
pub struct RosterMember {
    pub id: String,
    pub name: String,
    pub participant_type: ParticipantType,
    pub gender: Gender,
}

impl RosterMember {
    /// 从校验过的参与者构造（调用方保证 gender 非空且 active）
    pub fn from_participant(p: &Participant, gender: Gender) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            participant_type: p.participant_type,
            gender,
        }
    }
}

// ==========================================
// AssignContext - 分配上下文
// ==========================================

pub struct AssignContext {
    /// 启用成员，按 id 排序保证确定性
    members: Vec<RosterMember>,
    index: HashMap<String, usize>,

    pub ledger: FairnessLedger,
    /// participant_id → 保障记录
    pub absentees: HashMap<String, AbsenteeRecord>,
    /// 分部 → 核心时段配额
    pub quotas: HashMap<ParticipantType, CoreSlotQuota>,
    /// 上月快照: participant_id → (category_key → count)
    prior_counts: HashMap<String, HashMap<String, u32>>,
    /// B-1 预洗牌候选池（运行开始构建一次,分部各一份）
    pub b1_pools: HashMap<ParticipantType, Vec<String>>,

    /// 每人每月上限
    pub cap: u32,
}

impl AssignContext {
    /// 构建分配上下文
    ///
    /// # 构建内容
    /// - 核心时段配额: 逐分部统计展开骨架中的核心类别时段数
    /// - 缺席者目标: 人数*2 超过核心时段数则降为 1 并标记补位
    /// - B-1 候选池: 非缺席启用成员按 (上月总数, 上月核心数, id) 排序
    ///   后截取 2*核心时段数,一次性洗牌
    pub fn build(
        mut members: Vec<RosterMember>,
        prior_counts: HashMap<String, HashMap<String, u32>>,
        absentee_ids: &[String],
        days: &[DaySchedule],
        rng: &mut ChaCha8Rng,
    ) -> Self {
        members.sort_by(|a, b| a.id.cmp(&b.id));
        let index: HashMap<String, usize> = members
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id.clone(), i))
            .collect();

        // ===== 核心时段配额 =====
        let mut quotas: HashMap<ParticipantType, CoreSlotQuota> = HashMap::new();
        for ptype in [ParticipantType::Elementary, ParticipantType::Middle] {
            let core_key = ptype.core_category();
            let total = days
                .iter()
                .flat_map(|d| d.slots.iter())
                .filter(|s| s.category_key.as_ref() == Some(&core_key))
                .count() as u32;
            quotas.insert(ptype, CoreSlotQuota { total, filled: 0 });
        }

        // ===== 缺席者保障目标 =====
        // 目标 = 2;若 缺席人数*2 > 该分部核心时段数,降为 1 并标记非核心补位
        let mut absentees_by_type: HashMap<ParticipantType, Vec<String>> = HashMap::new();
        for id in absentee_ids {
            if let Some(i) = index.get(id) {
                absentees_by_type
                    .entry(members[*i].participant_type)
                    .or_default()
                    .push(id.clone());
            }
        }
        let mut absentees = HashMap::new();
        for (ptype, ids) in &absentees_by_type {
            let core_total = quotas.get(ptype).map(|q| q.total).unwrap_or(0);
            let reduced = ids.len() as u32 * 2 > core_total;
            let (target, needs_top_up) = if reduced { (1, true) } else { (2, false) };
            for id in ids {
                absentees.insert(id.clone(), AbsenteeRecord::new(id.clone(), target, needs_top_up));
            }
        }

        // ===== B-1 预洗牌候选池 =====
        let mut b1_pools = HashMap::new();
        for ptype in [ParticipantType::Elementary, ParticipantType::Middle] {
            let core_key = ptype.core_category();
            let pool_size = quotas.get(&ptype).map(|q| q.total * 2).unwrap_or(0) as usize;

            let mut candidates: Vec<&RosterMember> = members
                .iter()
                .filter(|m| m.participant_type == ptype && !absentees.contains_key(&m.id))
                .collect();
            candidates.sort_by(|a, b| {
                let key_a = (
                    prior_count_of(&prior_counts, &a.id, TOTAL_KEY),
                    prior_count_of(&prior_counts, &a.id, core_key.as_str()),
                );
                let key_b = (
                    prior_count_of(&prior_counts, &b.id, TOTAL_KEY),
                    prior_count_of(&prior_counts, &b.id, core_key.as_str()),
                );
                key_a.cmp(&key_b).then_with(|| a.id.cmp(&b.id))
            });

            let mut pool: Vec<String> = candidates
                .into_iter()
                .take(pool_size)
                .map(|m| m.id.clone())
                .collect();
            pool.shuffle(rng);
            b1_pools.insert(ptype, pool);
        }

        Self {
            members,
            index,
            ledger: FairnessLedger::new(),
            absentees,
            quotas,
            prior_counts,
            b1_pools,
            cap: MAX_ASSIGNMENTS_PER_MONTH,
        }
    }

    // ==========================================
    // 名册视图查询
    // ==========================================

    pub fn members(&self) -> &[RosterMember] {
        &self.members
    }

    pub fn member(&self, id: &str) -> Option<&RosterMember> {
        self.index.get(id).map(|i| &self.members[*i])
    }

    pub fn gender_of(&self, id: &str) -> Option<Gender> {
        self.member(id).map(|m| m.gender)
    }

    /// 指定分部的成员 id（按 id 升序）
    pub fn ids_of_type(&self, ptype: ParticipantType) -> Vec<String> {
        self.members
            .iter()
            .filter(|m| m.participant_type == ptype)
            .map(|m| m.id.clone())
            .collect()
    }

    pub fn is_absentee(&self, id: &str) -> bool {
        self.absentees.contains_key(id)
    }

    /// 缺席者且保障目标未兑现完
    pub fn is_owing_absentee(&self, id: &str) -> bool {
        self.absentees.get(id).map(|r| r.owing()).unwrap_or(false)
    }

    // ==========================================
    // 上月快照查询
    // ==========================================

    pub fn prior_total(&self, id: &str) -> u32 {
        prior_count_of(&self.prior_counts, id, TOTAL_KEY)
    }

    pub fn prior_count(&self, id: &str, key: &str) -> u32 {
        prior_count_of(&self.prior_counts, id, key)
    }

    // ==========================================
    // 通用资格判定
    // ==========================================

    /// 基础资格: 当日未分配、未到上限、周规则未阻断
    ///
    /// 周规则: 总次数 ≥ 2 后,已用周序号内不再接受新分配。
    pub fn can_take(&self, id: &str, day: &DaySchedule, week: u32) -> bool {
        if self.member(id).is_none() {
            return false;
        }
        if day.has_participant(id) {
            return false;
        }
        let total = self.ledger.total_of(id);
        if total >= self.cap {
            return false;
        }
        if total >= 2 && self.ledger.has_used_week(id, week) {
            return false;
        }
        true
    }

    // ==========================================
    // 分配提交
    // ==========================================

    /// 提交一对分配并更新全部记账
    ///
    /// fixed 中的 id 额外消耗缺席者保障配额；
    /// 核心类别时段同时推进该分部配额计数。
    pub fn commit_pair(
        &mut self,
        slot: &mut SlotAssignment,
        week: u32,
        first: &str,
        second: &str,
        fixed: &[String],
    ) {
        slot.assigned = vec![first.to_string(), second.to_string()];
        slot.fixed_for = fixed.to_vec();

        let category = slot.category_key.clone();
        self.ledger
            .record_assignment(first, category.as_ref(), week);
        self.ledger
            .record_assignment(second, category.as_ref(), week);

        for id in fixed {
            if let Some(rec) = self.absentees.get_mut(id) {
                rec.fulfilled += 1;
                rec.fixed_weeks.insert(week);
            }
        }

        if category.as_ref().map(|c| c.is_core()).unwrap_or(false) {
            if let Some(quota) = self.quotas.get_mut(&slot.participant_type) {
                quota.filled += 1;
            }
        }
    }

    /// 已排序候选列表中的第一对同性别组合
    pub fn first_compatible_pair(&self, ranked: &[String]) -> Option<(String, String)> {
        for i in 0..ranked.len() {
            let gender_i = match self.gender_of(&ranked[i]) {
                Some(g) => g,
                None => continue,
            };
            for item in ranked.iter().skip(i + 1) {
                if self.gender_of(item) == Some(gender_i) {
                    return Some((ranked[i].clone(), item.clone()));
                }
            }
        }
        None
    }

    /// 当周周序号（统一口径）
    pub fn week_of(day: &DaySchedule) -> u32 {
        use chrono::Datelike;
        CalendarExpander::week_index_of(day.date.day())
    }
}

fn prior_count_of(
    prior: &HashMap<String, HashMap<String, u32>>,
    id: &str,
    key: &str,
) -> u32 {
    prior
        .get(id)
        .and_then(|m| m.get(key))
        .copied()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SelectionMode;
    use crate::domain::{SlotTemplate, WeeklyTemplate};
    use chrono::Weekday;
    use rand::SeedableRng;

    fn member(id: &str, ptype: ParticipantType, gender: Gender) -> RosterMember {
        RosterMember {
            id: id.to_string(),
            name: format!("成员{}", id),
            participant_type: ptype,
            gender,
        }
    }

    fn core_days(weekdays: &[Weekday]) -> Vec<DaySchedule> {
        let template = WeeklyTemplate::new(
            weekdays
                .iter()
                .map(|&weekday| SlotTemplate {
                    weekday,
                    time: "06:00".to_string(),
                    participant_type: ParticipantType::Elementary,
                    selection_mode: SelectionMode::Sequential,
                    category_key: Some(crate::domain::types::CategoryKey::elementary_core()),
                })
                .collect(),
        );
        CalendarExpander::expand_month(2026, 6, &template)
    }

    #[test]
    fn test_absentee_target_normal() {
        // 2026-06: 周一~周五各出现 4~5 次,周一/三/五核心时段共 13 个
        let days = core_days(&[Weekday::Mon, Weekday::Wed, Weekday::Fri]);
        let members = vec![
            member("a", ParticipantType::Elementary, Gender::Male),
            member("b", ParticipantType::Elementary, Gender::Male),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let ctx = AssignContext::build(
            members,
            HashMap::new(),
            &["a".to_string()],
            &days,
            &mut rng,
        );

        let rec = ctx.absentees.get("a").expect("缺席记录应存在");
        assert_eq!(rec.target, 2);
        assert!(!rec.needs_top_up);
    }

    #[test]
    fn test_absentee_target_reduced_when_scarce() {
        // 只有周一 -> 核心时段 5 个,缺席 3 人 * 2 = 6 > 5,目标降为 1
        let days = core_days(&[Weekday::Mon]);
        let members = vec![
            member("a", ParticipantType::Elementary, Gender::Male),
            member("b", ParticipantType::Elementary, Gender::Male),
            member("c", ParticipantType::Elementary, Gender::Female),
            member("d", ParticipantType::Elementary, Gender::Female),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let ctx = AssignContext::build(
            members,
            HashMap::new(),
            &["a".to_string(), "b".to_string(), "c".to_string()],
            &days,
            &mut rng,
        );

        for id in ["a", "b", "c"] {
            let rec = ctx.absentees.get(id).expect("缺席记录应存在");
            assert_eq!(rec.target, 1);
            assert!(rec.needs_top_up);
        }
    }

    #[test]
    fn test_b1_pool_excludes_absentees_and_caps_size() {
        let days = core_days(&[Weekday::Mon]); // 核心时段 5 个 → 池上限 10
        let mut members = Vec::new();
        for i in 0..15 {
            members.push(member(
                &format!("m{:02}", i),
                ParticipantType::Elementary,
                Gender::Male,
            ));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let ctx = AssignContext::build(
            members,
            HashMap::new(),
            &["m00".to_string()],
            &days,
            &mut rng,
        );

        let pool = ctx
            .b1_pools
            .get(&ParticipantType::Elementary)
            .expect("候选池应存在");
        assert_eq!(pool.len(), 10);
        assert!(!pool.contains(&"m00".to_string()));
    }

    #[test]
    fn test_can_take_weekly_rule() {
        let days = core_days(&[Weekday::Mon]);
        let members = vec![member("a", ParticipantType::Elementary, Gender::Male)];
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut ctx =
            AssignContext::build(members, HashMap::new(), &[], &days, &mut rng);

        let day = days[0].clone();
        let week = AssignContext::week_of(&day);
        assert!(ctx.can_take("a", &day, week));

        // 总数 2 次且本周已用 → 阻断
        ctx.ledger.record_assignment("a", None, week);
        ctx.ledger.record_assignment("a", None, 3);
        assert!(!ctx.can_take("a", &day, week));
        // 未用过的周仍可排
        assert!(ctx.can_take("a", &day, 2));
    }
}
