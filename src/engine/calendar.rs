// ==========================================
// 月度轮值排班系统 - 周模板展开引擎
// ==========================================
// 依据: Roster_Rules_v1.md - 2. 周模板与月度排班
// 红线: 无状态、无副作用、无 I/O 操作
// ==========================================
// 职责: 把固定周模板展开为目标月份逐日的空白排班
// 输入: 目标年月 + 周模板
// 输出: 有序 DaySchedule 列表（只含当日有时段的日期）
// ==========================================

use crate::domain::schedule::{DaySchedule, SlotAssignment, WeeklyTemplate};
use chrono::{Datelike, NaiveDate};

// ==========================================
// CalendarExpander - 周模板展开引擎
// ==========================================
pub struct CalendarExpander;

impl CalendarExpander {
    /// 目标月份的天数
    ///
    /// 调用方保证 year/month 合法；非法输入回退为 30 天而非 panic。
    pub fn days_in_month(year: i32, month: u32) -> u32 {
        let first = NaiveDate::from_ymd_opt(year, month, 1);
        let next_first = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        };
        match (first, next_first) {
            (Some(a), Some(b)) => b.signed_duration_since(a).num_days() as u32,
            _ => 30,
        }
    }

    /// 周序号: (日 - 1) / 7
    ///
    /// 刻意的粗粒度分桶（每月 4~5 桶），不是 ISO 周；
    /// 所有周相关判定必须经由本函数，保证口径一致。
    pub fn week_index_of(day: u32) -> u32 {
        (day - 1) / 7
    }

    /// 展开整月排班骨架
    ///
    /// # 规则
    /// - 1..=当月天数 逐日遍历
    /// - 当日 weekday 在模板中有 ≥1 个时段才生成 DaySchedule
    /// - 时段按模板内顺序生成空白分配
    pub fn expand_month(year: i32, month: u32, template: &WeeklyTemplate) -> Vec<DaySchedule> {
        let mut days = Vec::new();
        for day in 1..=Self::days_in_month(year, month) {
            let date = match NaiveDate::from_ymd_opt(year, month, day) {
                Some(d) => d,
                None => continue,
            };
            let weekday = date.weekday();
            let slots: Vec<SlotAssignment> = template
                .slots_for(weekday)
                .map(SlotAssignment::from_template)
                .collect();
            if slots.is_empty() {
                continue;
            }
            days.push(DaySchedule {
                date,
                weekday,
                slots,
            });
        }
        days
    }
}
