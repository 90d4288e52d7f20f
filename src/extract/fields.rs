use crate::extract::grouper::RowRole;
use crate::models::schedule::Field;

/// 按块内行位置与列号查找目标字段，超出范围的列返回 None
pub fn field_at(role: RowRole, cell: usize) -> Option<Field> {
    match (role, cell) {
        (RowRole::First, 0) => Some(Field::StockReleaseDate),
        (RowRole::First, 1) => Some(Field::Code),
        (RowRole::First, 2) => Some(Field::StockCount),
        (RowRole::Second, 0) => Some(Field::ProvisionalCondition),
        (RowRole::Second, 1) => Some(Field::ReleasePrice),
        (RowRole::Second, 2) => Some(Field::BookBuildingDateRange),
        (RowRole::Third, 0) => Some(Field::InitialPrice),
        (RowRole::Third, 1) => Some(Field::RiseRate),
        (RowRole::Third, 2) => Some(Field::Secretary),
        // 事业内容行可能被拆成多个单元格，以最后一个为准
        (RowRole::Fifth, _) => Some(Field::BusinessDescription),
        _ => None,
    }
}
