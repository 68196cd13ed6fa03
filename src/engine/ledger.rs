// ==========================================
// 月度轮值排班系统 - 公平性台账
// ==========================================
// 依据: Roster_Rules_v1.md - 3. 公平性约束
// ==========================================
// 职责: 本次运行内的可变记账
// - 每人总次数 / 分类别次数（含合成 total 键）
// - 每人已用周序号集合
// - 运行内只增不减
// ==========================================

use crate::domain::schedule::CategoryCountRecord;
use crate::domain::types::CategoryKey;
use std::collections::{HashMap, HashSet};

/// 每人每月轮值次数上限
pub const MAX_ASSIGNMENTS_PER_MONTH: u32 = 3;

// ==========================================
// FairnessLedger - 公平性台账
// ==========================================

#[derive(Debug, Default)]
struct LedgerEntry {
    /// category_key → 次数（含合成 "total" 键）
    counts: HashMap<String, u32>,
    /// 已用周序号
    used_weeks: HashSet<u32>,
}

/// 公平性台账
///
/// 显式对象逐阶段传递，绝不做包级单例；
/// 多个月份 / 测试夹具可各自独立运行。
#[derive(Debug, Default)]
pub struct FairnessLedger {
    entries: HashMap<String, LedgerEntry>,
}

impl FairnessLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记一次分配
    ///
    /// 总次数 +1；若有类别键则该类别 +1；周序号入集合。
    pub fn record_assignment(
        &mut self,
        participant_id: &str,
        category: Option<&CategoryKey>,
        week_index: u32,
    ) {
        let entry = self.entries.entry(participant_id.to_string()).or_default();
        *entry
            .counts
            .entry(crate::domain::types::TOTAL_KEY.to_string())
            .or_insert(0) += 1;
        if let Some(key) = category {
            *entry.counts.entry(key.as_str().to_string()).or_insert(0) += 1;
        }
        entry.used_weeks.insert(week_index);
    }

    /// 本次运行总次数（未知 id 返回 0）
    pub fn total_of(&self, participant_id: &str) -> u32 {
        self.entries
            .get(participant_id)
            .and_then(|e| e.counts.get(crate::domain::types::TOTAL_KEY))
            .copied()
            .unwrap_or(0)
    }

    /// 本次运行指定类别次数（未知 id/键返回 0）
    pub fn category_count_of(&self, participant_id: &str, key: &CategoryKey) -> u32 {
        self.entries
            .get(participant_id)
            .and_then(|e| e.counts.get(key.as_str()))
            .copied()
            .unwrap_or(0)
    }

    /// 指定周序号是否已用（未知 id 返回 false）
    pub fn has_used_week(&self, participant_id: &str, week_index: u32) -> bool {
        self.entries
            .get(participant_id)
            .map(|e| e.used_weeks.contains(&week_index))
            .unwrap_or(false)
    }

    /// 导出快照行（只含 count > 0 的项，含 total 键）
    ///
    /// 排序保证落库顺序确定。
    pub fn snapshot(&self) -> Vec<CategoryCountRecord> {
        let mut records = Vec::new();
        for (id, entry) in &self.entries {
            for (key, count) in &entry.counts {
                if *count > 0 {
                    records.push(CategoryCountRecord {
                        participant_id: id.clone(),
                        category_key: CategoryKey::new(key.clone()),
                        count: *count,
                    });
                }
            }
        }
        records.sort_by(|a, b| {
            a.participant_id
                .cmp(&b.participant_id)
                .then_with(|| a.category_key.as_str().cmp(b.category_key.as_str()))
        });
        records
    }
}

// ==========================================
// AbsenteeRecord - 缺席者保障记录
// ==========================================

/// 缺席者保障记录
///
/// 运行开始时由上月缺席名单推导；只在核心分配各阶段变化。
#[derive(Debug, Clone)]
pub struct AbsenteeRecord {
    pub participant_id: String,
    /// 本月保障目标（1 或 2）
    pub target: u32,
    /// 已兑现的保障次数
    pub fulfilled: u32,
    /// 已用于保障分配的周序号
    pub fixed_weeks: HashSet<u32>,
    /// 目标降为 1 时标记,进入非核心补位扫描
    pub needs_top_up: bool,
}

impl AbsenteeRecord {
    pub fn new(participant_id: impl Into<String>, target: u32, needs_top_up: bool) -> Self {
        Self {
            participant_id: participant_id.into(),
            target,
            fulfilled: 0,
            fixed_weeks: HashSet::new(),
            needs_top_up,
        }
    }

    /// 保障目标尚未兑现完
    pub fn owing(&self) -> bool {
        self.fulfilled < self.target
    }
}

// ==========================================
// CoreSlotQuota - 核心时段配额
// ==========================================

/// 每核心类别的当月时段总数与已填数
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreSlotQuota {
    pub total: u32,
    pub filled: u32,
}

impl CoreSlotQuota {
    /// 仍有未填的核心时段
    pub fn remaining(&self) -> bool {
        self.filled < self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_query() {
        let mut ledger = FairnessLedger::new();
        let core = CategoryKey::elementary_core();

        ledger.record_assignment("p1", Some(&core), 0);
        ledger.record_assignment("p1", None, 2);

        assert_eq!(ledger.total_of("p1"), 2);
        assert_eq!(ledger.category_count_of("p1", &core), 1);
        assert!(ledger.has_used_week("p1", 0));
        assert!(ledger.has_used_week("p1", 2));
        assert!(!ledger.has_used_week("p1", 1));
    }

    #[test]
    fn test_unknown_id_reads_zero() {
        let ledger = FairnessLedger::new();
        assert_eq!(ledger.total_of("nobody"), 0);
        assert_eq!(
            ledger.category_count_of("nobody", &CategoryKey::middle_core()),
            0
        );
        assert!(!ledger.has_used_week("nobody", 0));
    }

    #[test]
    fn test_snapshot_only_positive_counts() {
        let mut ledger = FairnessLedger::new();
        ledger.record_assignment("p2", Some(&CategoryKey::middle_core()), 1);

        let snapshot = ledger.snapshot();
        // total + middle-core 两行
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.iter().all(|r| r.count > 0));
        assert!(snapshot
            .iter()
            .any(|r| r.category_key.as_str() == crate::domain::types::TOTAL_KEY));
    }

    #[test]
    fn test_absentee_owing() {
        let mut rec = AbsenteeRecord::new("p1", 2, false);
        assert!(rec.owing());
        rec.fulfilled = 2;
        assert!(!rec.owing());
    }
}
