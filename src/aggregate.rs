use crate::table::{Table, TableError, Value};

/// Returns the `n` rows with the largest values in `column`, ties kept in table order.
pub fn top_n(table: &Table, column: &str, n: usize) -> Result<Table, TableError> {
    let values = table.numeric_column(column)?;
    let mut order: Vec<usize> = (0..table.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let rows = order
        .into_iter()
        .take(n)
        .map(|index| table.rows[index].clone())
        .collect();

    Ok(Table::new(table.columns.clone(), rows))
}

/// Integer columns sum to `Value::Int`; anything with a float cell sums to `Value::Float`.
pub fn sum(table: &Table, column: &str) -> Result<Value, TableError> {
    let mut int_total = 0i64;
    let mut float_total = 0.0f64;
    let mut saw_float = false;

    for value in table.column(column)? {
        match value {
            Value::Int(v) => {
                int_total = int_total.saturating_add(*v);
                float_total += *v as f64;
            }
            Value::Float(v) => {
                saw_float = true;
                float_total += v;
            }
            Value::Text(_) => return Err(TableError::NotNumeric(column.to_string())),
        }
    }

    Ok(if saw_float {
        Value::Float(float_total)
    } else {
        Value::Int(int_total)
    })
}

pub fn mean(table: &Table, column: &str) -> Result<Option<f64>, TableError> {
    let values = table.numeric_column(column)?;
    if values.is_empty() {
        return Ok(None);
    }
    Ok(Some(values.iter().sum::<f64>() / values.len() as f64))
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Keeps the left/right row pairs whose key cells are equal as strings.
///
/// Both column sets survive. A shared key name is merged into one column;
/// any other clash is suffixed `_x` (left) and `_y` (right).
pub fn inner_join(
    left: &Table,
    right: &Table,
    left_key: &str,
    right_key: &str,
) -> Result<Table, TableError> {
    let left_index = left.column_index(left_key)?;
    let right_index = right.column_index(right_key)?;
    let merged_key = left_key == right_key;

    let right_kept: Vec<usize> = (0..right.columns.len())
        .filter(|&index| !(merged_key && index == right_index))
        .collect();

    let mut columns = Vec::with_capacity(left.columns.len() + right_kept.len());
    for (index, name) in left.columns.iter().enumerate() {
        let clashes = right_kept.iter().any(|&r| &right.columns[r] == name);
        let is_merged_key = merged_key && index == left_index;
        if clashes && !is_merged_key {
            columns.push(format!("{name}_x"));
        } else {
            columns.push(name.clone());
        }
    }
    for &index in &right_kept {
        let name = &right.columns[index];
        if left.columns.contains(name) {
            columns.push(format!("{name}_y"));
        } else {
            columns.push(name.clone());
        }
    }

    let mut rows = Vec::new();
    for left_row in &left.rows {
        let key = left_row[left_index].to_string();
        for right_row in &right.rows {
            if right_row[right_index].to_string() != key {
                continue;
            }
            let mut row = left_row.clone();
            row.extend(right_kept.iter().map(|&index| right_row[index].clone()));
            rows.push(row);
        }
    }

    Ok(Table::new(columns, rows))
}

/// Distinct values of `column` with their counts, most frequent first.
pub fn value_counts(table: &Table, column: &str) -> Result<Vec<(String, usize)>, TableError> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for value in table.column(column)? {
        let key = value.to_string();
        match counts.iter_mut().find(|(seen, _)| *seen == key) {
            Some((_, count)) => *count += 1,
            None => counts.push((key, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(counts)
}
