//! Expense tracking tools backed by a JSON file (`~/data/expenses.json` by default).
//!
//! Dates are `YYYY-MM-DD` strings, so range filters compare them as text.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;

use super::{parse_args, Tool, ToolError};

use crate::constants::EXPENSES_FILENAME;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Expense {
    category: String,
    amount: f64,
    date: String,
    #[serde(default)]
    description: String,
}

/// Shared handle to the expenses file.
#[derive(Debug, Clone)]
pub struct ExpenseLedger {
    path: Option<PathBuf>,
}

impl ExpenseLedger {
    /// `path` overrides the default location under the home directory.
    pub fn new(path: Option<PathBuf>) -> Self {
        let path = path.or_else(|| dirs::home_dir().map(|h| h.join(EXPENSES_FILENAME)));
        Self { path }
    }

    fn path(&self) -> Result<&PathBuf, ToolError> {
        self.path.as_ref().ok_or_else(|| {
            ToolError::new("HomeNotFound", "Could not determine the home directory")
        })
    }

    /// Every recorded expense. A missing or unreadable ledger is empty.
    fn load(&self) -> Result<Vec<Expense>, ToolError> {
        let path = self.path()?;
        let Ok(content) = fs::read_to_string(path) else {
            return Ok(Vec::new());
        };
        Ok(serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "expenses file unreadable, starting over");
            Vec::new()
        }))
    }

    fn append(&self, expense: Expense) -> Result<(), ToolError> {
        let mut expenses = self.load()?;
        expenses.push(expense);
        let path = self.path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(&expenses)
            .map_err(|e| ToolError::new("SerializationError", e.to_string()))?;
        fs::write(path, body)?;
        Ok(())
    }
}

fn check_date(date: &str, label: &str) -> Result<(), ToolError> {
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map(|_| ())
        .map_err(|_| {
            ToolError::new(
                "ValueError",
                format!("Invalid {}: {}. Date must be in YYYY-MM-DD format.", label, date),
            )
        })
}

pub struct RecordExpenseTool {
    ledger: ExpenseLedger,
}

impl RecordExpenseTool {
    pub fn new(ledger: ExpenseLedger) -> Self {
        Self { ledger }
    }
}

#[derive(Deserialize)]
struct RecordExpenseInput {
    category: String,
    amount: f64,
    date: String,
    #[serde(default)]
    description: String,
}

impl Tool for RecordExpenseTool {
    fn name(&self) -> &str {
        "record_expense"
    }

    fn description(&self) -> &str {
        "Record an expense with a category, amount and date.\n\
         Dates are YYYY-MM-DD. When the user says \"today\" or gives no date, \
         call get_time first and use the resolved date."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "category": { "type": "string", "description": "Category, e.g. 'Food' or 'Transport'" },
                "amount": { "type": "number", "description": "Amount spent" },
                "date": { "type": "string", "description": "Date of the expense (YYYY-MM-DD)" },
                "description": { "type": "string", "description": "Optional note" }
            },
            "required": ["category", "amount", "date"]
        })
    }

    fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let input: RecordExpenseInput = parse_args(params)?;
        check_date(&input.date, "date")?;

        let message = format!(
            "Successfully recorded expense: {} in {} on {}.",
            input.amount, input.category, input.date
        );
        self.ledger.append(Expense {
            category: input.category,
            amount: input.amount,
            date: input.date,
            description: input.description,
        })?;
        Ok(Value::String(message))
    }
}

pub struct ListExpensesTool {
    ledger: ExpenseLedger,
}

impl ListExpensesTool {
    pub fn new(ledger: ExpenseLedger) -> Self {
        Self { ledger }
    }
}

#[derive(Deserialize)]
struct ListExpensesInput {
    category: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

impl Tool for ListExpensesTool {
    fn name(&self) -> &str {
        "list_expenses"
    }

    fn description(&self) -> &str {
        "List recorded expenses, optionally filtered by category and date range.\n\
         Present the result to the user as a table."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "category": { "type": "string", "description": "Only this category (case-insensitive)" },
                "start_date": { "type": "string", "description": "Earliest date, inclusive (YYYY-MM-DD)" },
                "end_date": { "type": "string", "description": "Latest date, inclusive (YYYY-MM-DD)" }
            }
        })
    }

    fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let input: ListExpensesInput = parse_args(params)?;
        if let Some(start) = &input.start_date {
            check_date(start, "start_date")?;
        }
        if let Some(end) = &input.end_date {
            check_date(end, "end_date")?;
        }

        let matching: Vec<Expense> = self
            .ledger
            .load()?
            .into_iter()
            .filter(|e| {
                input
                    .category
                    .as_ref()
                    .is_none_or(|c| e.category.eq_ignore_ascii_case(c))
            })
            .filter(|e| input.start_date.as_ref().is_none_or(|s| e.date >= *s))
            .filter(|e| input.end_date.as_ref().is_none_or(|end| e.date <= *end))
            .collect();
        serde_json::to_value(matching).map_err(|e| ToolError::new("SerializationError", e.to_string()))
    }
}
