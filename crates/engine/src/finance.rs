//! Revenue, cost and profit derived from egg counts and expenses.

use serde::{Deserialize, Serialize};

use crate::{ExpenseCategory, ExpenseEvent, MoneyCents, TimeWindow};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub total: MoneyCents,
    /// Fraction of the windowed expense total, in `[0, 1]`.
    pub share: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub total_expense: MoneyCents,
    pub total_revenue: MoneyCents,
    /// May be negative.
    pub net_profit: MoneyCents,
    /// Zero when no egg was produced in the window.
    pub cost_per_egg: MoneyCents,
    /// Ordered by first occurrence of each category.
    pub expense_breakdown: Vec<CategoryTotal>,
}

/// Expenses whose timestamp falls in `window`; all of them when unbounded.
pub fn windowed_expenses<'a>(
    expenses: &'a [ExpenseEvent],
    window: &'a TimeWindow,
) -> impl Iterator<Item = &'a ExpenseEvent> + 'a {
    expenses
        .iter()
        .filter(move |expense| window.contains(expense.timestamp))
}

pub fn compute_financials<'a>(
    window_egg_total: u64,
    windowed_expenses: impl IntoIterator<Item = &'a ExpenseEvent>,
    price_per_egg: MoneyCents,
) -> FinancialSummary {
    let mut breakdown: Vec<(ExpenseCategory, MoneyCents)> = Vec::new();
    for expense in windowed_expenses {
        match breakdown
            .iter_mut()
            .find(|(category, _)| *category == expense.category)
        {
            Some((_, total)) => *total += expense.amount,
            None => breakdown.push((expense.category, expense.amount)),
        }
    }

    let total_expense: MoneyCents = breakdown.iter().map(|(_, total)| *total).sum();
    let total_revenue = price_per_egg.times(window_egg_total);

    let expense_breakdown = breakdown
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category,
            total,
            share: if total_expense.is_zero() {
                0.0
            } else {
                total.cents() as f64 / total_expense.cents() as f64
            },
        })
        .collect();

    FinancialSummary {
        total_expense,
        total_revenue,
        net_profit: total_revenue - total_expense,
        cost_per_egg: total_expense.per_unit(window_egg_total),
        expense_breakdown,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::window::{Granularity, resolve};

    fn expense(id: &str, category: ExpenseCategory, cents: i64, day: u32) -> ExpenseEvent {
        let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        ExpenseEvent::on_date(id, category, MoneyCents::new(cents), date, &Utc)
    }

    #[test]
    fn revenue_profit_and_unit_cost() {
        let expenses = vec![
            expense("a", ExpenseCategory::Feed, 500, 2),
            expense("b", ExpenseCategory::Medicine, 300, 3),
        ];
        let summary = compute_financials(10, &expenses, MoneyCents::new(150));
        assert_eq!(summary.total_revenue, MoneyCents::new(1500));
        assert_eq!(summary.total_expense, MoneyCents::new(800));
        assert_eq!(summary.net_profit, MoneyCents::new(700));
        assert_eq!(summary.cost_per_egg, MoneyCents::new(80));
    }

    #[test]
    fn no_eggs_means_zero_unit_cost_and_negative_profit() {
        let expenses = vec![expense("a", ExpenseCategory::Equipment, 1200, 2)];
        let summary = compute_financials(0, &expenses, MoneyCents::new(150));
        assert_eq!(summary.cost_per_egg, MoneyCents::ZERO);
        assert_eq!(summary.total_revenue, MoneyCents::ZERO);
        assert_eq!(summary.net_profit, MoneyCents::new(-1200));
    }

    #[test]
    fn huge_expenses_saturate_instead_of_panicking() {
        let huge: MoneyCents = "50000000000000000".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let expenses = vec![
            ExpenseEvent::on_date("a", ExpenseCategory::Feed, huge, date, &Utc),
            ExpenseEvent::on_date("b", ExpenseCategory::Feed, huge, date, &Utc),
        ];
        let summary = compute_financials(1, &expenses, MoneyCents::ZERO);
        let max = MoneyCents::new(i64::MAX);
        assert_eq!(summary.total_expense, max);
        assert_eq!(summary.expense_breakdown[0].total, max);
        assert_eq!(summary.net_profit, MoneyCents::new(-i64::MAX));
        assert_eq!(summary.cost_per_egg, max);
    }

    #[test]
    fn breakdown_keeps_first_occurrence_order() {
        let expenses = vec![
            expense("a", ExpenseCategory::Medicine, 100, 2),
            expense("b", ExpenseCategory::Feed, 200, 3),
            expense("c", ExpenseCategory::Medicine, 100, 4),
        ];
        let summary = compute_financials(4, &expenses, MoneyCents::ZERO);
        let order: Vec<ExpenseCategory> = summary
            .expense_breakdown
            .iter()
            .map(|c| c.category)
            .collect();
        assert_eq!(order, vec![ExpenseCategory::Medicine, ExpenseCategory::Feed]);
        assert_eq!(summary.expense_breakdown[0].total, MoneyCents::new(200));
        assert_eq!(summary.expense_breakdown[0].share, 0.5);
    }

    #[test]
    fn only_windowed_expenses_count() {
        let mut expenses = vec![expense("a", ExpenseCategory::Feed, 500, 31)];
        let april = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        expenses.push(ExpenseEvent::on_date(
            "b",
            ExpenseCategory::Feed,
            MoneyCents::new(900),
            april,
            &Utc,
        ));
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        let march = resolve(Granularity::Month, 0, &now);
        let summary =
            compute_financials(0, windowed_expenses(&expenses, &march), MoneyCents::ZERO);
        assert_eq!(summary.total_expense, MoneyCents::new(500));

        let all = resolve(Granularity::All, 0, &now);
        let summary = compute_financials(0, windowed_expenses(&expenses, &all), MoneyCents::ZERO);
        assert_eq!(summary.total_expense, MoneyCents::new(1400));
    }

    #[test]
    fn empty_breakdown_without_expenses() {
        let summary = compute_financials(3, std::iter::empty(), MoneyCents::new(100));
        assert!(summary.expense_breakdown.is_empty());
        assert_eq!(summary.net_profit, MoneyCents::new(300));
    }
}
