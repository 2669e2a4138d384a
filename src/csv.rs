use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::amount::AmountParseError;
use crate::replay::BalanceRow;
use crate::{Amount, Instruction};

/// Errors that can occur when reading instruction rows
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("cannot open {path}: {source}")]
    Open { path: String, source: csv::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized instruction type '{kind}'")]
    UnrecognizedType { line: usize, kind: String },

    #[error("line {line}: {kind} missing {field}")]
    MissingField {
        line: usize,
        kind: &'static str,
        field: &'static str,
    },

    #[error("line {line}: {source}")]
    InvalidAmount {
        line: usize,
        source: AmountParseError,
    },
}

#[derive(Debug, Deserialize)]
struct InputRow {
    r#type: String,
    account: String,
    to: Option<String>,
    amount: Option<String>,
}

#[derive(Debug, Serialize)]
struct OutputRow<'a> {
    design: String,
    account: &'a str,
    balance: String,
}

/// Read instructions from a csv file with a `type,account,to,amount` header
pub fn read_instructions(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Instruction, CsvError>>, CsvError> {
    let path = path.as_ref();
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| CsvError::Open {
            path: path.display().to_string(),
            source,
        })?;

    Ok(reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            parse_row(line, row)
        }))
}

fn parse_row(line: usize, row: InputRow) -> Result<Instruction, CsvError> {
    match row.r#type.as_str() {
        "open" => Ok(Instruction::Open {
            account: row.account,
        }),
        "deposit" => {
            let amount = required(line, "deposit", "amount", row.amount)?;
            Ok(Instruction::Deposit {
                account: row.account,
                amount: parse_amount(line, &amount)?,
            })
        }
        "transfer" => {
            let to = required(line, "transfer", "to", row.to)?;
            let amount = required(line, "transfer", "amount", row.amount)?;
            Ok(Instruction::Transfer {
                from: row.account,
                to,
                amount: parse_amount(line, &amount)?,
            })
        }
        other => Err(CsvError::UnrecognizedType {
            line,
            kind: other.to_string(),
        }),
    }
}

fn required(
    line: usize,
    kind: &'static str,
    field: &'static str,
    value: Option<String>,
) -> Result<String, CsvError> {
    value
        .filter(|value| !value.is_empty())
        .ok_or(CsvError::MissingField { line, kind, field })
}

fn parse_amount(line: usize, raw: &str) -> Result<Amount, CsvError> {
    raw.parse()
        .map_err(|source| CsvError::InvalidAmount { line, source })
}

/// Write balances in csv format with a `design,account,balance` header
pub fn write_balances<'a>(
    writer: impl io::Write,
    rows: impl IntoIterator<Item = &'a BalanceRow>,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);

    for row in rows {
        writer.serialize(OutputRow {
            design: row.design.to_string(),
            account: &row.account,
            balance: row.balance.to_string(),
        })?;
    }

    writer.flush()?;
    Ok(())
}
