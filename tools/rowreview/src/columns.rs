use crate::config::ColumnRole;

pub const ALL_COLUMNS_SECTION: &str = "Row";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledCell {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSection {
    pub name: String,
    pub cells: Vec<LabeledCell>,
}

/// Groups a row's cells by configured role. Without roles every column is
/// shown in one section. Cells past the row's end, and empty cells, are left
/// out; a missing header falls back to `Column N`.
pub fn sections_for_row(roles: &[ColumnRole], headers: &[String], row: &[String]) -> Vec<RoleSection> {
    if roles.is_empty() {
        let all = (0..headers.len().max(row.len())).collect::<Vec<_>>();
        return vec![section(ALL_COLUMNS_SECTION, &all, headers, row)];
    }
    roles
        .iter()
        .map(|role| section(&role.name, &role.indices, headers, row))
        .collect()
}

fn section(name: &str, indices: &[usize], headers: &[String], row: &[String]) -> RoleSection {
    let cells = indices
        .iter()
        .filter_map(|&column| {
            let value = row.get(column)?;
            if value.is_empty() {
                return None;
            }
            Some(LabeledCell {
                label: column_label(headers, column),
                value: value.clone(),
            })
        })
        .collect();
    RoleSection {
        name: name.to_string(),
        cells,
    }
}

pub fn column_label(headers: &[String], column: usize) -> String {
    match headers.get(column) {
        Some(header) if !header.trim().is_empty() => header.clone(),
        _ => format!("Column {}", column + 1),
    }
}
