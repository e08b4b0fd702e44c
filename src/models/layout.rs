use serde::{Deserialize, Serialize};

/// Logical field a report column carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnRole {
    QuestionNumber,
    Topic,
    Mark,
    Status,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 4] = [
        ColumnRole::QuestionNumber,
        ColumnRole::Topic,
        ColumnRole::Mark,
        ColumnRole::Status,
    ];

    fn slot(self) -> usize {
        match self {
            ColumnRole::QuestionNumber => 0,
            ColumnRole::Topic => 1,
            ColumnRole::Mark => 2,
            ColumnRole::Status => 3,
        }
    }
}

/// 1-based worksheet coordinate. Deserializing rejects row or column 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCellPosition")]
pub struct CellPosition {
    pub row: u32,
    pub col: u32,
}

impl CellPosition {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

#[derive(Deserialize)]
struct RawCellPosition {
    row: u32,
    col: u32,
}

impl TryFrom<RawCellPosition> for CellPosition {
    type Error = String;

    fn try_from(raw: RawCellPosition) -> Result<Self, Self::Error> {
        if raw.row == 0 || raw.col == 0 {
            return Err(format!(
                "cell position is 1-based, got row {} col {}",
                raw.row, raw.col
            ));
        }
        Ok(Self::new(raw.row, raw.col))
    }
}

/// Role -> 1-based column index. Absent roles are not written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    columns: [Option<u32>; 4],
}

impl ColumnMap {
    /// {question_number: 1, topic: 2, mark: 3, status: 4}
    pub fn default_layout() -> Self {
        Self {
            columns: [Some(1), Some(2), Some(3), Some(4)],
        }
    }

    pub fn get(&self, role: ColumnRole) -> Option<u32> {
        self.columns[role.slot()]
    }

    /// Assigns `col` to `role` unless the role is already mapped; the first
    /// (left-most) assignment wins.
    pub fn assign_if_absent(&mut self, role: ColumnRole, col: u32) -> bool {
        let slot = &mut self.columns[role.slot()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(col);
        true
    }

    pub fn max_column(&self) -> Option<u32> {
        self.columns.iter().flatten().copied().max()
    }

    pub fn contains_column(&self, col: u32) -> bool {
        self.columns.iter().flatten().any(|&c| c == col)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(Option::is_none)
    }

    /// Mapped roles in role order.
    pub fn iter(&self) -> impl Iterator<Item = (ColumnRole, u32)> + '_ {
        ColumnRole::ALL
            .iter()
            .filter_map(move |&role| self.get(role).map(|col| (role, col)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutSource {
    /// Header row found by keyword scan.
    Discovered,
    /// No header matched; default layout applied.
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetLayout {
    pub header_row: u32,
    pub columns: ColumnMap,
    pub source: LayoutSource,
}

impl SheetLayout {
    pub fn default_layout() -> Self {
        Self {
            header_row: 1,
            columns: ColumnMap::default_layout(),
            source: LayoutSource::Default,
        }
    }

    pub fn first_data_row(&self) -> u32 {
        self.header_row + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_position_rejects_zero() {
        let ok: CellPosition = serde_json::from_str(r#"{"row":3,"col":2}"#).unwrap();
        assert_eq!(ok, CellPosition::new(3, 2));
        assert!(serde_json::from_str::<CellPosition>(r#"{"row":0,"col":2}"#).is_err());
        assert!(serde_json::from_str::<CellPosition>(r#"{"row":1,"col":0}"#).is_err());
    }

    #[test]
    fn first_assignment_wins() {
        let mut map = ColumnMap::default();
        assert!(map.assign_if_absent(ColumnRole::Topic, 3));
        assert!(!map.assign_if_absent(ColumnRole::Topic, 5));
        assert_eq!(map.get(ColumnRole::Topic), Some(3));
        assert_eq!(map.get(ColumnRole::Mark), None);
        assert_eq!(map.max_column(), Some(3));
    }

    #[test]
    fn iter_skips_absent_roles() {
        let mut map = ColumnMap::default();
        map.assign_if_absent(ColumnRole::Status, 7);
        map.assign_if_absent(ColumnRole::QuestionNumber, 2);
        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(
            pairs,
            vec![(ColumnRole::QuestionNumber, 2), (ColumnRole::Status, 7)]
        );
        assert!(map.contains_column(7));
        assert!(!map.contains_column(3));
    }
}
