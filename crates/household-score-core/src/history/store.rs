use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::scoring::records::{HouseholdFinances, ScoredRecord};
use crate::types::{Money, Percent};
use crate::{ScoreError, ScoreResult};

/// Columns of the persisted history, in write order.
pub const HISTORY_COLUMNS: [&str; 11] = [
    "Family_ID",
    "Member_ID",
    "Amount",
    "Income",
    "Monthly_Expenses",
    "Loan_Payments",
    "Credit_Card_Spending",
    "Savings",
    "Category",
    "Financial_Score",
    "Recommendation",
];

/// Scoring-run sequence number. Not required on read: files written
/// elsewhere may lack it, and rows without it are grouped by content.
pub const RUN_COLUMN: &str = "Run_ID";

/// Header written when this store creates the file.
const WRITE_COLUMNS: [&str; 12] = [
    "Family_ID",
    "Member_ID",
    "Amount",
    "Income",
    "Monthly_Expenses",
    "Loan_Payments",
    "Credit_Card_Spending",
    "Savings",
    "Category",
    "Financial_Score",
    "Recommendation",
    RUN_COLUMN,
];

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// One persisted scored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    #[serde(rename = "Family_ID")]
    pub household_id: String,
    #[serde(rename = "Member_ID")]
    pub member_id: String,
    #[serde(rename = "Amount", with = "rust_decimal::serde::str")]
    pub amount: Money,
    #[serde(rename = "Income", with = "rust_decimal::serde::str")]
    pub income: Money,
    #[serde(rename = "Monthly_Expenses", with = "rust_decimal::serde::str")]
    pub monthly_expenses: Money,
    #[serde(rename = "Loan_Payments", with = "rust_decimal::serde::str")]
    pub loan_payments: Money,
    #[serde(rename = "Credit_Card_Spending", with = "rust_decimal::serde::str")]
    pub credit_card_spending: Money,
    #[serde(rename = "Savings", with = "rust_decimal::serde::str")]
    pub savings: Money,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Financial_Score", with = "rust_decimal::serde::str")]
    pub financial_score: Percent,
    #[serde(rename = "Recommendation")]
    pub recommendation: String,
    /// Every row appended by one `append` call shares the same id.
    #[serde(rename = "Run_ID", default)]
    pub run_id: Option<u64>,
}

impl HistoryRow {
    pub fn finances(&self) -> HouseholdFinances {
        HouseholdFinances {
            income: self.income,
            monthly_expenses: self.monthly_expenses,
            loan_payments: self.loan_payments,
            credit_card_spending: self.credit_card_spending,
            savings: self.savings,
        }
    }

    /// Cell values in `WRITE_COLUMNS` order.
    fn cells(&self) -> Vec<String> {
        let money = |d: Decimal| d.to_string();
        vec![
            self.household_id.clone(),
            self.member_id.clone(),
            money(self.amount),
            money(self.income),
            money(self.monthly_expenses),
            money(self.loan_payments),
            money(self.credit_card_spending),
            money(self.savings),
            self.category.clone(),
            money(self.financial_score),
            self.recommendation.clone(),
            self.run_id.map(|id| id.to_string()).unwrap_or_default(),
        ]
    }

    /// Parse one row of an external table. `position` maps column names to
    /// cell indices; `index` is the zero-based row number used in errors.
    fn parse(position: &HashMap<&str, usize>, row: &[String], index: usize) -> ScoreResult<Self> {
        let text = |column: &str| position.get(column).map_or("", |&i| row[i].as_str());
        let decimal = |column: &str| -> ScoreResult<Decimal> {
            let raw = text(column).trim();
            Decimal::from_str(raw).map_err(|_| ScoreError::InvalidInput {
                field: format!("row {index}, {column}"),
                reason: format!("'{raw}' is not a decimal number."),
            })
        };
        let household_id = text("Family_ID");
        if household_id.trim().is_empty() {
            return Err(ScoreError::InvalidInput {
                field: format!("row {index}, Family_ID"),
                reason: "Household id must not be blank.".into(),
            });
        }
        Ok(HistoryRow {
            household_id: household_id.to_string(),
            member_id: text("Member_ID").to_string(),
            amount: decimal("Amount")?,
            income: decimal("Income")?,
            monthly_expenses: decimal("Monthly_Expenses")?,
            loan_payments: decimal("Loan_Payments")?,
            credit_card_spending: decimal("Credit_Card_Spending")?,
            savings: decimal("Savings")?,
            category: text("Category").to_string(),
            financial_score: decimal("Financial_Score")?,
            recommendation: text("Recommendation").to_string(),
            run_id: None,
        })
    }
}

impl From<&ScoredRecord> for HistoryRow {
    fn from(r: &ScoredRecord) -> Self {
        HistoryRow {
            household_id: r.household_id.clone(),
            member_id: r.member_id.clone(),
            amount: r.amount,
            income: r.income,
            monthly_expenses: r.monthly_expenses,
            loan_payments: r.loan_payments,
            credit_card_spending: r.credit_card_spending,
            savings: r.savings,
            category: r.category.clone(),
            financial_score: r.financial_score,
            recommendation: r.recommendation.clone(),
            run_id: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Append-only CSV spreadsheet of scored records.
///
/// Rows are never rewritten. A file whose header lacks any of
/// `HISTORY_COLUMNS` is rejected for both reads and writes. Concurrent
/// writers are not coordinated.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header of the existing file, or `None` when there is no file yet.
    pub fn headers(&self) -> ScoreResult<Option<Vec<String>>> {
        match fs::metadata(&self.path) {
            Ok(meta) if meta.len() > 0 => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let mut rdr = csv::Reader::from_path(&self.path)?;
        let headers = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        Ok(Some(headers))
    }

    /// Append a scored batch as one new run. Returns the number of rows
    /// written.
    pub fn append(&self, records: &[ScoredRecord]) -> ScoreResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let run_id = self.next_run_id()?;
        let rows = records.iter().map(|r| {
            HistoryRow {
                run_id: Some(run_id),
                ..HistoryRow::from(r)
            }
            .cells()
        });
        self.write_aligned(rows, records.len())
    }

    /// Append an externally produced table. Its header must name every
    /// history column; extra columns are dropped. Every row is parsed before
    /// anything is written, so a bad cell leaves the file untouched.
    pub fn append_table(&self, headers: &[String], rows: &[Vec<String>]) -> ScoreResult<usize> {
        check_columns(headers, &HISTORY_COLUMNS)?;
        for (i, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(ScoreError::InvalidInput {
                    field: format!("row {i}"),
                    reason: format!(
                        "Expected {} cells, found {}.",
                        headers.len(),
                        row.len()
                    ),
                });
            }
        }
        let position: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim(), i))
            .collect();
        let parsed = rows
            .iter()
            .enumerate()
            .map(|(i, row)| HistoryRow::parse(&position, row, i))
            .collect::<ScoreResult<Vec<_>>>()?;
        self.write_aligned(parsed.iter().map(HistoryRow::cells), parsed.len())
    }

    /// Read every persisted row. A missing file yields an empty history.
    pub fn load(&self) -> ScoreResult<Vec<HistoryRow>> {
        let Some(headers) = self.headers()? else {
            return Ok(Vec::new());
        };
        check_columns(&headers, &HISTORY_COLUMNS)?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_path(&self.path)?;
        let rows = rdr
            .deserialize::<HistoryRow>()
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(path = %self.path.display(), rows = rows.len(), "loaded history");
        Ok(rows)
    }

    fn next_run_id(&self) -> ScoreResult<u64> {
        let last = self.load()?.iter().filter_map(|r| r.run_id).max();
        Ok(last.map_or(1, |id| id + 1))
    }

    /// Write `rows` (laid out per `WRITE_COLUMNS`) under the file's existing
    /// header, or under `WRITE_COLUMNS` when the file is new. Columns the
    /// existing header lacks are dropped.
    fn write_aligned<I>(&self, rows: I, count: usize) -> ScoreResult<usize>
    where
        I: Iterator<Item = Vec<String>>,
    {
        if count == 0 {
            return Ok(0);
        }

        let existing = self.headers()?;
        if let Some(ref target) = existing {
            check_columns(target, &HISTORY_COLUMNS)?;
        }
        let target: Vec<String> = existing
            .clone()
            .unwrap_or_else(|| WRITE_COLUMNS.iter().map(|c| c.to_string()).collect());

        let position: HashMap<&str, usize> =
            WRITE_COLUMNS.iter().enumerate().map(|(i, c)| (*c, i)).collect();
        let layout: Vec<Option<usize>> = target
            .iter()
            .map(|c| position.get(c.as_str()).copied())
            .collect();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if existing.is_none() {
            wtr.write_record(&target)?;
        }

        let mut written = 0;
        for row in rows {
            let record: Vec<&str> = layout
                .iter()
                .map(|slot| slot.and_then(|i| row.get(i)).map_or("", |s| s.as_str()))
                .collect();
            wtr.write_record(&record)?;
            written += 1;
        }
        wtr.flush()?;

        tracing::info!(path = %self.path.display(), rows = written, "appended to history");
        Ok(written)
    }
}

/// Fail with the list of `required` columns absent from `headers`.
pub fn check_columns<S: AsRef<str>>(headers: &[S], required: &[&str]) -> ScoreResult<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|col| !headers.iter().any(|h| h.as_ref().trim() == **col))
        .map(|col| col.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ScoreError::SchemaMismatch { missing })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn scored(household: &str, member: &str) -> ScoredRecord {
        ScoredRecord {
            household_id: household.into(),
            member_id: member.into(),
            category: "Other".into(),
            amount: dec!(4_000),
            income: dec!(10_000),
            monthly_expenses: dec!(4_000),
            loan_payments: dec!(1_000),
            credit_card_spending: dec!(500),
            savings: dec!(3_000),
            financial_score: dec!(66.25),
            recommendation: "Good: ".into(),
            sub_scores: None,
        }
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.csv"));
        assert!(store.load().unwrap().is_empty());
        assert!(store.headers().unwrap().is_none());
    }

    #[test]
    fn test_append_creates_header_then_appends() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.csv"));

        assert_eq!(store.append(&[scored("F1", "M1")]).unwrap(), 1);
        assert_eq!(store.append(&[scored("F2", "M1"), scored("F2", "M2")]).unwrap(), 2);

        let contents = fs::read_to_string(store.path()).unwrap();
        assert_eq!(contents.lines().count(), 4);
        assert_eq!(contents.lines().next().unwrap(), WRITE_COLUMNS.join(","));

        let rows = store.load().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            HistoryRow {
                run_id: Some(1),
                ..HistoryRow::from(&scored("F1", "M1"))
            }
        );
        assert_eq!(rows[2].member_id, "M2");
    }

    #[test]
    fn test_each_append_is_a_new_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.csv"));
        store.append(&[scored("F1", "M1"), scored("F1", "M2")]).unwrap();
        store.append(&[scored("F1", "M1")]).unwrap();

        let runs: Vec<Option<u64>> = store.load().unwrap().iter().map(|r| r.run_id).collect();
        assert_eq!(runs, vec![Some(1), Some(1), Some(2)]);
    }

    #[test]
    fn test_file_without_run_column_still_loads_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        fs::write(
            &path,
            format!(
                "{}\nF1,M1,4000,10000,4000,1000,500,3000,Other,66.25,Good: \n",
                HISTORY_COLUMNS.join(",")
            ),
        )
        .unwrap();
        let store = HistoryStore::new(&path);

        store.append(&[scored("F2", "M1")]).unwrap();
        let rows = store.load().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.run_id.is_none()));
        assert_eq!(rows[1].household_id, "F2");
    }

    #[test]
    fn test_recommendation_trailing_space_survives() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.csv"));
        store.append(&[scored("F1", "M1")]).unwrap();
        assert_eq!(store.load().unwrap()[0].recommendation, "Good: ");
    }

    #[test]
    fn test_empty_batch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.csv"));
        assert_eq!(store.append(&[]).unwrap(), 0);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_existing_file_missing_columns_rejected_without_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        fs::write(&path, "Family_ID,Member_ID,Amount\nF1,M1,10\n").unwrap();
        let store = HistoryStore::new(&path);

        match store.append(&[scored("F1", "M1")]).unwrap_err() {
            ScoreError::SchemaMismatch { missing } => {
                assert_eq!(missing.len(), 8);
                assert!(missing.contains(&"Financial_Score".to_string()));
            }
            other => panic!("Expected SchemaMismatch, got {other:?}"),
        }
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Family_ID,Member_ID,Amount\nF1,M1,10\n"
        );
        assert!(matches!(store.load(), Err(ScoreError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_append_table_requires_all_columns() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.csv"));
        let headers: Vec<String> = HISTORY_COLUMNS[..10].iter().map(|c| c.to_string()).collect();
        match store.append_table(&headers, &[]).unwrap_err() {
            ScoreError::SchemaMismatch { missing } => {
                assert_eq!(missing, vec!["Recommendation".to_string()])
            }
            other => panic!("Expected SchemaMismatch, got {other:?}"),
        }
        assert!(!store.path().exists());
    }

    #[test]
    fn test_append_table_reorders_columns() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.csv"));
        let mut headers: Vec<String> = HISTORY_COLUMNS.iter().rev().map(|c| c.to_string()).collect();
        headers.push("Notes".into());
        let row: Vec<String> = vec![
            "Average: ", "55", "Food", "100", "50", "20", "10", "5000", "12", "B", "F3", "x",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        assert_eq!(store.append_table(&headers, &[row]).unwrap(), 1);
        let rows = store.load().unwrap();
        assert_eq!(rows[0].household_id, "F3");
        assert_eq!(rows[0].income, dec!(5000));
        assert_eq!(rows[0].amount, dec!(12));
        assert_eq!(rows[0].financial_score, dec!(55));
    }

    #[test]
    fn test_append_table_rejects_unparsable_cells_without_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.csv"));
        store.append(&[scored("F1", "M1")]).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        let headers: Vec<String> = HISTORY_COLUMNS.iter().map(|c| c.to_string()).collect();
        let good: Vec<String> = [
            "F2", "M1", "10", "5000", "20", "10", "5", "12", "Food", "55", "Average: ",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();
        let mut bad = good.clone();
        bad[2] = "abc".into();

        match store.append_table(&headers, &[good, bad]).unwrap_err() {
            ScoreError::InvalidInput { field, .. } => assert_eq!(field, "row 1, Amount"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_append_table_rejects_blank_household() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.csv"));
        let headers: Vec<String> = HISTORY_COLUMNS.iter().map(|c| c.to_string()).collect();
        let row: Vec<String> = [
            " ", "M1", "10", "5000", "20", "10", "5", "12", "Food", "55", "Average: ",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();
        let err = store.append_table(&headers, &[row]).unwrap_err();
        assert!(matches!(err, ScoreError::InvalidInput { .. }));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_append_table_rejects_ragged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.csv"));
        let headers: Vec<String> = HISTORY_COLUMNS.iter().map(|c| c.to_string()).collect();
        let err = store
            .append_table(&headers, &[vec!["F1".to_string()]])
            .unwrap_err();
        assert!(matches!(err, ScoreError::InvalidInput { .. }));
    }

    #[test]
    fn test_check_columns_lists_missing() {
        let err = check_columns(&["Income", "Savings"], &["Savings", "Income", "Category"])
            .unwrap_err();
        match err {
            ScoreError::SchemaMismatch { missing } => assert_eq!(missing, vec!["Category"]),
            other => panic!("Expected SchemaMismatch, got {other:?}"),
        }
    }
}
