use crate::errors::{EncodingWarning, NotifierError, Result};
use crate::extract::fields::field_at;
use crate::extract::grouper::{group_rows, BlockMarker, RowBlock};
use crate::extract::normalizer::{CellEncoding, TextNormalizer};
use crate::models::schedule::ScheduleRecord;
use log::{debug, info, warn};
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

pub const TABLE_SELECTOR: &str = ".iposchedulelist";
pub const ROW_SELECTOR: &str = ".iposchedulelist tr";
pub const EXCLUDED_ROW_CLASS: &str = "iposchedulelist_tr1";
pub const BLOCK_START_CLASS: &str = "iposchedulelist_tr_top";
const CELL_SELECTOR: &str = "td";
const COMPANY_SELECTOR: &str = "h2 a";
const CHART_SELECTOR: &str = "div a.minkabubtn";
const RELEASE_SELECTOR: &str = "div a.kaijibtn";

/// 从 DOM 中抽出的一行，文本尚未去除空白
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRow {
    pub block_start: bool,
    pub cells: Vec<String>,
    /// 表头行中的公司名与详情链接
    pub company: Option<(String, Option<String>)>,
    pub chart_href: Option<String>,
    pub release_href: Option<String>,
}

impl BlockMarker for SourceRow {
    fn is_block_start(&self) -> bool {
        self.block_start
    }
}

/// 一次抓取的组装结果
#[derive(Debug, Default)]
pub struct Assembly {
    pub records: Vec<ScheduleRecord>,
    pub warnings: Vec<EncodingWarning>,
}

struct Selectors {
    table: Selector,
    row: Selector,
    cell: Selector,
    company: Selector,
    chart: Selector,
    release: Selector,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| NotifierError::FetchError(format!("invalid selector {}: {:?}", css, e)))
}

pub struct RecordAssembler {
    base_url: Url,
    normalizer: TextNormalizer,
    selectors: Selectors,
}

impl RecordAssembler {
    pub fn new(base_url: Url, normalizer: TextNormalizer) -> Result<Self> {
        Ok(Self {
            base_url,
            normalizer,
            selectors: Selectors {
                table: selector(TABLE_SELECTOR)?,
                row: selector(ROW_SELECTOR)?,
                cell: selector(CELL_SELECTOR)?,
                company: selector(COMPANY_SELECTOR)?,
                chart: selector(CHART_SELECTOR)?,
                release: selector(RELEASE_SELECTOR)?,
            },
        })
    }

    /// 解码并解析整页，组装记录
    pub fn assemble_page(&self, body: &[u8]) -> Result<Assembly> {
        let (html, encoding) = self.normalizer.decode_page(body);
        let rows = self.parse_rows(&html)?;
        self.assemble(&rows, encoding)
    }

    /// 提取日程表中的行，排除带有排除标记的行
    pub fn parse_rows(&self, html: &str) -> Result<Vec<SourceRow>> {
        let document = Html::parse_document(html);
        if document.select(&self.selectors.table).next().is_none() {
            return Err(NotifierError::FetchError(format!(
                "schedule table {} not found in page",
                TABLE_SELECTOR
            )));
        }

        let rows: Vec<SourceRow> = document
            .select(&self.selectors.row)
            .filter(|tr| !has_class(tr, EXCLUDED_ROW_CLASS))
            .map(|tr| self.source_row(tr))
            .collect();

        debug!("Found {} schedule rows", rows.len());
        Ok(rows)
    }

    fn source_row(&self, tr: ElementRef<'_>) -> SourceRow {
        let company = tr.select(&self.selectors.company).last().map(|a| {
            (
                a.text().collect::<String>(),
                a.value().attr("href").map(str::to_string),
            )
        });

        SourceRow {
            block_start: has_class(&tr, BLOCK_START_CLASS),
            cells: tr
                .select(&self.selectors.cell)
                .map(|td| td.text().collect::<String>())
                .collect(),
            company,
            chart_href: last_href(tr, &self.selectors.chart),
            release_href: last_href(tr, &self.selectors.release),
        }
    }

    /// 将分组后的行组装为记录，保持页面顺序
    pub fn assemble(&self, rows: &[SourceRow], encoding: CellEncoding) -> Result<Assembly> {
        let blocks = group_rows(rows)?;
        let mut assembly = Assembly::default();

        for block in &blocks {
            let record = self.build_record(block, encoding, &mut assembly.warnings);
            assembly.records.push(record);
        }

        info!(
            "Assembled {} schedule records ({} encoding fallbacks)",
            assembly.records.len(),
            assembly.warnings.len()
        );
        Ok(assembly)
    }

    fn build_record(
        &self,
        block: &RowBlock<'_, SourceRow>,
        encoding: CellEncoding,
        warnings: &mut Vec<EncodingWarning>,
    ) -> ScheduleRecord {
        let mut normalize = |raw: &str| {
            let normalized = self.normalizer.normalize_cell(raw, encoding);
            if let Some(warning) = normalized.warning() {
                warnings.push(warning.clone());
            }
            normalized.into_text()
        };

        let mut record = ScheduleRecord::default();

        if let Some((name, href)) = &block.header.company {
            record.company_name = normalize(name.as_str());
            if let Some(href) = href {
                record.detail_url = self.detail_url(href);
            }
        }
        record.chart_url = block.header.chart_href.clone().unwrap_or_default();
        record.release_url = block.header.release_href.clone().unwrap_or_default();

        for (role, row) in block.continuation_rows() {
            for (index, cell) in row.cells.iter().enumerate() {
                if let Some(field) = field_at(role, index) {
                    record.set(field, normalize(cell.as_str()));
                }
            }
        }

        record
    }

    fn detail_url(&self, href: &str) -> String {
        match self.base_url.join(href) {
            Ok(url) => url.to_string(),
            Err(e) => {
                warn!("Cannot join detail link {} to {}: {}", href, self.base_url, e);
                href.to_string()
            }
        }
    }
}

fn has_class(element: &ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

fn last_href(tr: ElementRef<'_>, selector: &Selector) -> Option<String> {
    tr.select(selector)
        .last()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
}
