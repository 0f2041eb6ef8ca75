use anyhow::{Result, bail};
use chrono::{Days, Local, NaiveDate};

use crate::models::{DayPlan, MealPlan, MealSlot, PlannedMeal};
use crate::store::{KEY_MEAL_PLAN, KEY_MEAL_PLANNER_START_DATE, Store};

pub const DAYS_PER_WEEK: u64 = 7;

/// Weekly meal assignments plus the week the planner is showing.
///
/// Every mutation writes the full plan to the store first and only then
/// updates the in-memory copy, so a failed write changes nothing.
pub struct MealPlanner<'a> {
    store: &'a Store,
    plan: MealPlan,
    start_date: Option<NaiveDate>,
}

impl<'a> MealPlanner<'a> {
    pub fn load(store: &'a Store) -> Result<Self> {
        let plan: MealPlan = store.get_or_default(KEY_MEAL_PLAN)?;
        let start_date: Option<NaiveDate> = store.get(KEY_MEAL_PLANNER_START_DATE, None)?;
        Ok(Self {
            store,
            plan,
            start_date,
        })
    }

    #[must_use]
    pub fn plan(&self) -> &MealPlan {
        &self.plan
    }

    /// First day of the displayed week; today when never set.
    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn set_start_date(&mut self, date: NaiveDate) -> Result<()> {
        self.store.set(KEY_MEAL_PLANNER_START_DATE, &date)?;
        self.start_date = Some(date);
        Ok(())
    }

    #[must_use]
    pub fn day(&self, date: NaiveDate) -> Option<&DayPlan> {
        self.plan.get(&date)
    }

    pub fn meals_for(&self, date: NaiveDate, slot: MealSlot) -> Vec<&PlannedMeal> {
        self.plan
            .get(&date)
            .map(|d| d.in_slot(slot).collect())
            .unwrap_or_default()
    }

    /// Seven consecutive days from `start`, with empty plans for unplanned days.
    #[must_use]
    pub fn week(&self, start: NaiveDate) -> Vec<(NaiveDate, DayPlan)> {
        (0..DAYS_PER_WEEK)
            .filter_map(|i| start.checked_add_days(Days::new(i)))
            .map(|date| (date, self.plan.get(&date).cloned().unwrap_or_default()))
            .collect()
    }

    pub fn add_meal(
        &mut self,
        date: NaiveDate,
        slot: MealSlot,
        meal: &PlannedMeal,
    ) -> Result<&MealPlan> {
        let mut meal = meal.clone();
        meal.slot = slot;
        tracing::debug!(%date, %slot, recipe_id = meal.recipe_id, "adding meal");
        let mut plan = self.plan.clone();
        plan.entry(date).or_default().meals.push(meal);
        self.commit(plan)?;
        Ok(&self.plan)
    }

    /// Remove the meal at `index` in the date's full meal list.
    pub fn remove_meal(&mut self, date: NaiveDate, index: usize) -> Result<&MealPlan> {
        let mut plan = self.plan.clone();
        let Some(day) = plan.get_mut(&date) else {
            bail!("No meals planned for {date}");
        };
        if index >= day.meals.len() {
            bail!(
                "Meal index {index} out of range for {date} ({} planned)",
                day.meals.len()
            );
        }
        day.meals.remove(index);
        if day.meals.is_empty() {
            plan.remove(&date);
        }
        self.commit(plan)?;
        Ok(&self.plan)
    }

    /// Remove the `index`-th meal among those in `slot` on `date`.
    pub fn remove_meal_in_slot(
        &mut self,
        date: NaiveDate,
        slot: MealSlot,
        index: usize,
    ) -> Result<&MealPlan> {
        let position = self.plan.get(&date).and_then(|day| {
            day.meals
                .iter()
                .enumerate()
                .filter(|(_, m)| m.slot == slot)
                .nth(index)
                .map(|(i, _)| i)
        });
        match position {
            Some(i) => self.remove_meal(date, i),
            None => bail!("No {slot} meal #{index} planned for {date}"),
        }
    }

    /// Drop everything planned for `date`. Returns false when nothing was planned.
    pub fn clear_day(&mut self, date: NaiveDate) -> Result<bool> {
        let mut plan = self.plan.clone();
        if plan.remove(&date).is_none() {
            return Ok(false);
        }
        self.commit(plan)?;
        Ok(true)
    }

    /// Adopt a generated plan. Only the dates it covers are overwritten.
    pub fn replace_with_generated(&mut self, generated: MealPlan) -> Result<&MealPlan> {
        let mut plan = self.plan.clone();
        for (date, day) in generated {
            if day.meals.is_empty() {
                plan.remove(&date);
            } else {
                plan.insert(date, day);
            }
        }
        self.commit(plan)?;
        Ok(&self.plan)
    }

    fn commit(&mut self, plan: MealPlan) -> Result<()> {
        self.store.set(KEY_MEAL_PLAN, &plan)?;
        self.plan = plan;
        Ok(())
    }
}
