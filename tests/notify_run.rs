use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use encoding_rs::EUC_JP;

use bookbuilding_notify::notify::{NotificationKind, Notifier};
use bookbuilding_notify::scrapers::base::PageSource;
use bookbuilding_notify::store::{MemoryStore, RecordStore};
use bookbuilding_notify::util::MonthDay;
use bookbuilding_notify::{Config, NotifierError, NotifyService, Result, ScheduleRecord, TriggerEvaluator};

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail_on_call: Option<usize>,
}

impl RecordingNotifier {
    fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::default()
        }
    }

    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    fn titles_for(&self, code: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(_, c)| c == code)
            .map(|(t, _)| t)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, title: &str, record: &ScheduleRecord) -> Result<()> {
        let mut sent = self.sent.lock().unwrap();
        if self.fail_on_call == Some(sent.len()) {
            return Err(NotifierError::NotificationError("webhook unavailable".to_string()));
        }
        sent.push((title.to_string(), record.code.clone()));
        Ok(())
    }
}

/// 上传失败的存储
struct BrokenStore;

#[async_trait]
impl RecordStore for BrokenStore {
    async fn find(&self, _code: &str) -> Result<Vec<ScheduleRecord>> {
        Ok(Vec::new())
    }

    async fn upsert(&self, _record: &ScheduleRecord) -> Result<()> {
        Err(NotifierError::StoreError("table unavailable".to_string()))
    }

    async fn all(&self) -> Result<Vec<ScheduleRecord>> {
        Ok(Vec::new())
    }
}

struct StaticPage(Vec<u8>);

#[async_trait]
impl PageSource for StaticPage {
    fn source_name(&self) -> String {
        "static".to_string()
    }

    async fn fetch_page(&self) -> Result<Vec<u8>> {
        Ok(self.0.clone())
    }
}

fn record(code: &str) -> ScheduleRecord {
    ScheduleRecord {
        company_name: format!("Company {}", code),
        code: code.to_string(),
        ..ScheduleRecord::default()
    }
}

fn tomorrow() -> MonthDay {
    MonthDay::new(3, 15)
}

#[tokio::test]
async fn unknown_code_notifies_once_and_known_code_does_not() {
    let store = Arc::new(MemoryStore::with_records(vec![record("1111")]));
    let notifier = Arc::new(RecordingNotifier::default());
    let evaluator = TriggerEvaluator::new(store.clone(), notifier.clone());

    let summary = evaluator
        .evaluate(&[record("1111"), record("2222")], tomorrow())
        .await
        .unwrap();

    assert_eq!(summary.records, 2);
    assert_eq!(summary.new_listings, 1);
    assert!(notifier.titles_for("1111").is_empty());
    assert_eq!(
        notifier.titles_for("2222"),
        vec![NotificationKind::NewListing.title().to_string()]
    );
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn second_run_does_not_repeat_new_listing() {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let evaluator = TriggerEvaluator::new(store.clone(), notifier.clone());
    let records = vec![record("3333"), record("4444")];

    let first = evaluator.evaluate(&records, tomorrow()).await.unwrap();
    let second = evaluator.evaluate(&records, tomorrow()).await.unwrap();

    assert_eq!(first.new_listings, 2);
    assert_eq!(second.new_listings, 0);
    assert_eq!(notifier.sent().len(), 2);
}

#[tokio::test]
async fn milestone_notifications_follow_new_listing() {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let evaluator = TriggerEvaluator::new(store, notifier.clone());

    let mut due = record("5555");
    due.provisional_condition = "03/15".to_string();
    due.book_building_date_range = "03/15 - 03/20".to_string();
    let mut not_due = record("6666");
    not_due.provisional_condition = "03/16".to_string();
    not_due.book_building_date_range = "03/15".to_string();

    let summary = evaluator.evaluate(&[due, not_due], tomorrow()).await.unwrap();

    assert_eq!(summary.milestone_notifications, 2);
    assert_eq!(
        notifier.titles_for("5555"),
        vec![
            NotificationKind::NewListing.title().to_string(),
            NotificationKind::ProvisionalConditionTomorrow.title().to_string(),
            NotificationKind::BookBuildingStartsTomorrow.title().to_string(),
        ]
    );
    assert_eq!(
        notifier.titles_for("6666"),
        vec![NotificationKind::NewListing.title().to_string()]
    );
}

#[tokio::test]
async fn notification_failure_stops_run_and_keeps_earlier_writes() {
    let store = Arc::new(MemoryStore::new());
    // 第二次发送失败：第二条记录的新上市通知
    let notifier = Arc::new(RecordingNotifier::failing_on(1));
    let evaluator = TriggerEvaluator::new(store.clone(), notifier.clone());

    let err = evaluator
        .evaluate(&[record("7001"), record("7002"), record("7003")], tomorrow())
        .await
        .unwrap_err();

    assert!(matches!(err, NotifierError::NotificationError(_)));
    assert_eq!(notifier.sent().len(), 1);
    assert_eq!(store.find("7001").await.unwrap().len(), 1);
    assert!(store.find("7002").await.unwrap().is_empty());
    assert!(store.find("7003").await.unwrap().is_empty());
}

#[tokio::test]
async fn store_failure_stops_run() {
    let notifier = Arc::new(RecordingNotifier::default());
    let evaluator = TriggerEvaluator::new(Arc::new(BrokenStore), notifier.clone());

    let err = evaluator
        .evaluate(&[record("8001"), record("8002")], tomorrow())
        .await
        .unwrap_err();

    assert!(matches!(err, NotifierError::StoreError(_)));
    // 新上市通知在写入之前已经发出
    assert_eq!(notifier.titles_for("8001").len(), 1);
    assert!(notifier.titles_for("8002").is_empty());
}

fn euc_jp_page() -> Vec<u8> {
    let html = r#"<html><body><table class="iposchedulelist">
<tr class="iposchedulelist_tr1"><th>見出し</th></tr>
<tr class="iposchedulelist_tr_top"><td>
  <h2><a href="/ipo/company.php?id=9999">株式会社サンプル</a></h2>
  <div><a class="minkabubtn" href="https://minkabu.jp/stock/9999">株価</a></div>
</td></tr>
<tr><td>03/15</td><td>9999</td><td>500,000株</td></tr>
<tr><td>未定</td><td>03/14</td><td>03/10 - 03/14</td></tr>
<tr><td>-</td><td>-</td><td>大和証券</td></tr>
<tr><td>hidden</td></tr>
<tr><td> クラウドサービスの開発 </td></tr>
</table></body></html>"#;
    let (bytes, _, _) = EUC_JP.encode(html);
    bytes.into_owned()
}

#[tokio::test]
async fn full_run_extracts_page_and_notifies() {
    let config = Config::new().with_base_url("http://www.tokyoipo.com");
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let service = NotifyService::new(
        &config,
        Arc::new(StaticPage(euc_jp_page())),
        store.clone(),
        notifier.clone(),
    )
    .unwrap();

    // 东京时间 3/14 上午，明天是 3/15
    let now = Utc.with_ymd_and_hms(2024, 3, 14, 0, 30, 0).unwrap();
    let summary = service.run_at(now).await.unwrap();

    assert_eq!(summary.records, 1);
    assert_eq!(summary.new_listings, 1);
    assert_eq!(summary.milestone_notifications, 1);
    assert_eq!(summary.encoding_fallbacks, 0);
    assert_eq!(
        notifier.titles_for("9999"),
        vec![
            NotificationKind::NewListing.title().to_string(),
            NotificationKind::StockReleaseTomorrow.title().to_string(),
        ]
    );

    let stored = store.find("9999").await.unwrap();
    assert_eq!(stored.len(), 1);
    let stored = &stored[0];
    assert_eq!(stored.company_name, "株式会社サンプル");
    assert_eq!(stored.detail_url, "http://www.tokyoipo.com/ipo/company.php?id=9999");
    assert_eq!(stored.stock_count, "500,000株");
    assert_eq!(stored.provisional_condition, "未定");
    assert_eq!(stored.secretary, "大和証券");
    assert_eq!(stored.business_description, "クラウドサービスの開発");

    let again = service.run_at(now).await.unwrap();
    assert_eq!(again.new_listings, 0);
}

#[tokio::test]
async fn malformed_page_aborts_before_any_side_effect() {
    let page = r#"<table class="iposchedulelist">
<tr class="iposchedulelist_tr_top"><td><h2><a href="/a">A</a></h2></td></tr>
<tr><td>03/15</td><td>1000</td></tr>
<tr><td>x</td></tr>
<tr><td>y</td></tr>
</table>"#;
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let service = NotifyService::new(
        &Config::new(),
        Arc::new(StaticPage(page.as_bytes().to_vec())),
        store.clone(),
        notifier.clone(),
    )
    .unwrap();

    let err = service.run().await.unwrap_err();
    assert!(matches!(
        err,
        NotifierError::MalformedLayoutError { block_start: 0, trailing: 3 }
    ));
    assert!(store.is_empty());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn block_starting_in_hidden_row_is_notified_too() {
    let page = r#"<table class="iposchedulelist">
<tr class="iposchedulelist_tr_top"><td><h2><a href="/ipo/1111">一社目</a></h2></td></tr>
<tr><td>04/01</td><td>1111</td><td>100株</td></tr>
<tr><td>-</td><td>-</td><td>-</td></tr>
<tr><td>-</td><td>-</td><td>-</td></tr>
<tr class="iposchedulelist_tr_top"><td><h2><a href="/ipo/2222">二社目</a></h2></td></tr>
<tr><td>04/02</td><td>2222</td><td>200株</td></tr>
<tr><td>-</td><td>-</td><td>-</td></tr>
<tr><td>-</td><td>-</td><td>-</td></tr>
<tr><td>hidden</td></tr>
<tr><td>事業内容</td></tr>
</table>"#;
    let (bytes, _, _) = EUC_JP.encode(page);
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let service = NotifyService::new(
        &Config::new(),
        Arc::new(StaticPage(bytes.into_owned())),
        store.clone(),
        notifier.clone(),
    )
    .unwrap();

    let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let summary = service.run_at(now).await.unwrap();

    assert_eq!(summary.records, 2);
    assert_eq!(summary.new_listings, 2);
    assert_eq!(notifier.titles_for("1111").len(), 1);
    assert_eq!(notifier.titles_for("2222").len(), 1);
    assert_eq!(store.find("2222").await.unwrap()[0].company_name, "二社目");
}
