//! Nutrition tracking - meals, daily logs and macro targets

pub mod lookup;

use std::ops::{Add, AddAssign};

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calories (kcal) and macronutrients (g)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Macros {
    pub fn new(calories: f64, protein: f64, carbs: f64, fat: f64) -> Self {
        Self { calories, protein, carbs, fat }
    }

    /// Multiply every value, e.g. per-100g values by grams / 100
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein: self.protein * factor,
            carbs: self.carbs * factor,
            fat: self.fat * factor,
        }
    }

    /// NaN or infinity cannot be stored as JSON
    pub fn is_finite(&self) -> bool {
        [self.calories, self.protein, self.carbs, self.fat]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Calories implied by the macros (4/4/9 kcal per gram)
    pub fn estimated_calories(&self) -> f64 {
        self.protein * 4.0 + self.carbs * 4.0 + self.fat * 9.0
    }
}

impl Add for Macros {
    type Output = Macros;

    fn add(self, rhs: Macros) -> Macros {
        Macros {
            calories: self.calories + rhs.calories,
            protein: self.protein + rhs.protein,
            carbs: self.carbs + rhs.carbs,
            fat: self.fat + rhs.fat,
        }
    }
}

impl AddAssign for Macros {
    fn add_assign(&mut self, rhs: Macros) {
        *self = *self + rhs;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: u64,
    pub name: String,
    /// Local time of day, "HH:MM"
    #[serde(default)]
    pub time: Option<String>,
    #[serde(flatten)]
    pub macros: Macros,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
}

/// Meals logged on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayLog {
    pub date: NaiveDate,
    #[serde(default)]
    pub meals: Vec<Meal>,
}

impl DayLog {
    pub fn new(date: NaiveDate) -> Self {
        Self { date, meals: Vec::new() }
    }

    pub fn totals(&self) -> Macros {
        self.meals.iter().fold(Macros::default(), |acc, m| acc + m.macros)
    }

    /// Append a meal, assigning the next id within the day
    pub fn add_meal(&mut self, mut meal: Meal) -> u64 {
        meal.id = self.meals.iter().map(|m| m.id).max().map_or(1, |id| id + 1);
        let id = meal.id;
        self.meals.push(meal);
        id
    }

    pub fn remove_meal(&mut self, id: u64) -> bool {
        let before = self.meals.len();
        self.meals.retain(|m| m.id != id);
        self.meals.len() != before
    }
}

/// `end` and the `days` days before it, oldest first.
///
/// `None` when the range reaches past the earliest representable date.
pub fn days_ending(end: NaiveDate, days: u32) -> Option<Vec<NaiveDate>> {
    let start = end.checked_sub_days(Days::new(days as u64))?;
    Some(start.iter_days().take(days as usize + 1).collect())
}

/// Daily macro targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroTargets(pub Macros);

impl Default for MacroTargets {
    fn default() -> Self {
        Self(Macros::new(2000.0, 150.0, 200.0, 65.0))
    }
}

/// Progress of one macro toward its target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub consumed: f64,
    pub target: f64,
}

impl Progress {
    /// consumed / target, not clamped; 0 for a zero target
    pub fn fraction(&self) -> f64 {
        if self.target <= 0.0 {
            return 0.0;
        }
        self.consumed / self.target
    }

    pub fn remaining(&self) -> f64 {
        (self.target - self.consumed).max(0.0)
    }

    pub fn is_over(&self) -> bool {
        self.consumed > self.target
    }

    /// Fixed-width text bar, full when the target is reached
    pub fn bar(&self, width: usize) -> String {
        let filled = ((self.fraction().min(1.0)) * width as f64).round() as usize;
        format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroProgress {
    pub calories: Progress,
    pub protein: Progress,
    pub carbs: Progress,
    pub fat: Progress,
}

impl MacroProgress {
    pub fn new(consumed: Macros, targets: &MacroTargets) -> Self {
        let target = targets.0;
        Self {
            calories: Progress { consumed: consumed.calories, target: target.calories },
            protein: Progress { consumed: consumed.protein, target: target.protein },
            carbs: Progress { consumed: consumed.carbs, target: target.carbs },
            fat: Progress { consumed: consumed.fat, target: target.fat },
        }
    }

    /// Rows of (label, unit, progress) in display order
    pub fn rows(&self) -> [(&'static str, &'static str, Progress); 4] {
        [
            ("Calories", "kcal", self.calories),
            ("Protein", "g", self.protein),
            ("Carbs", "g", self.carbs),
            ("Fat", "g", self.fat),
        ]
    }
}
