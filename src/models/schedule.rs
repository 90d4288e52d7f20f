use serde::{Deserialize, Serialize};

/// IPO 日程记录，对应页面上一组 6 行
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub company_name: String,
    pub detail_url: String,
    pub chart_url: String,
    pub release_url: String,

    pub stock_release_date: String,
    pub code: String,
    pub stock_count: String,

    pub provisional_condition: String,
    pub release_price: String,
    pub book_building_date_range: String,

    pub initial_price: String,
    pub rise_rate: String,
    pub secretary: String,

    pub business_description: String,
}

/// 可从表格单元格提取的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    StockReleaseDate,
    Code,
    StockCount,
    ProvisionalCondition,
    ReleasePrice,
    BookBuildingDateRange,
    InitialPrice,
    RiseRate,
    Secretary,
    BusinessDescription,
}

impl ScheduleRecord {
    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::StockReleaseDate => &mut self.stock_release_date,
            Field::Code => &mut self.code,
            Field::StockCount => &mut self.stock_count,
            Field::ProvisionalCondition => &mut self.provisional_condition,
            Field::ReleasePrice => &mut self.release_price,
            Field::BookBuildingDateRange => &mut self.book_building_date_range,
            Field::InitialPrice => &mut self.initial_price,
            Field::RiseRate => &mut self.rise_rate,
            Field::Secretary => &mut self.secretary,
            Field::BusinessDescription => &mut self.business_description,
        };
        *slot = value;
    }
}
