use crate::entities::{
    REDEEM_PASSWORD_KEY, RecordStatus, RecordType, prize_entity as prizes,
    record_entity as records, setting_entity as settings,
};
use crate::error::{AppError, AppResult};
use crate::external::{IdentityOracle, MemberStatus};
use crate::models::{DrawOutcome, RedeemOutcome};
use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Utc};
use rand::Rng;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr, TransactionTrait,
};
use std::sync::Arc;
use std::time::Duration;

pub const MSG_MISSING_IDENTITY: &str = "手机号或年卡号不能为空";
pub const MSG_VERIFY_FAILED: &str = "会员验证失败。";
pub const MSG_NOT_MEMBER: &str = "亲~您还不是会员哦。";

pub const MSG_MISSING_PARAMS: &str = "参数不完整";
pub const MSG_NOT_FOUND_OR_EXPIRED: &str = "兑奖码不存在或已过期";
pub const MSG_ALREADY_REDEEMED: &str = "该奖品已被兑奖";
pub const MSG_WRONG_PASSWORD: &str = "兑奖密码错误";

const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(5);
/// 首次尝试 + 一次重试
const DRAW_ATTEMPTS: u32 = 2;

/// 按数量加权随机选择一个奖品。
///
/// 只考虑 quantity > 0 的奖品，并按 id 升序累加权重，保证同一随机数总是得到同一结果。
/// 浮点累加在极端情况下可能始终不超过随机值，此时返回顺序中的最后一个奖品。
pub fn select_prize<'a, R: Rng + ?Sized>(
    prizes: &'a [prizes::Model],
    rng: &mut R,
) -> Option<&'a prizes::Model> {
    let mut candidates: Vec<&prizes::Model> = prizes.iter().filter(|p| p.is_drawable()).collect();
    if candidates.is_empty() {
        return None;
    }
    candidates.sort_by_key(|p| p.id);

    let total: i64 = candidates.iter().map(|p| i64::from(p.quantity)).sum();
    let pick = rng.random::<f64>() * total as f64;

    let mut acc = 0f64;
    for p in &candidates {
        acc += f64::from(p.quantity);
        if pick < acc {
            return Some(*p);
        }
    }

    candidates.last().copied()
}

/// 当前自然年在给定时区下的区间 [1月1日, 次年1月1日)，转为 UTC
pub fn year_window<Tz: TimeZone>(now: &DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let tz = now.timezone();
    let year = now.year();
    (start_of_year(&tz, year), start_of_year(&tz, year + 1))
}

fn start_of_year<Tz: TimeZone>(tz: &Tz, year: i32) -> DateTime<Utc> {
    let naive = NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    match tz.from_local_datetime(&naive).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        None => naive.and_utc(),
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// 并发写入冲突: 唯一约束冲突，或 SQLite 忙 (SQLITE_BUSY / SQLITE_LOCKED)
fn is_concurrency_conflict(err: &DbErr) -> bool {
    if is_unique_violation(err) {
        return true;
    }
    let msg = err.to_string();
    msg.contains("database is locked") || msg.contains("database table is locked")
}

/// 抽奖与兑奖
#[derive(Clone)]
pub struct LotteryService {
    pool: DatabaseConnection,
    oracle: Arc<dyn IdentityOracle>,
    oracle_timeout: Duration,
    decrement_on_draw: bool,
}

impl LotteryService {
    pub fn new(pool: DatabaseConnection, oracle: Arc<dyn IdentityOracle>) -> Self {
        Self {
            pool,
            oracle,
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
            decrement_on_draw: false,
        }
    }

    /// 抽中后扣减奖品数量（与写记录在同一事务内）
    pub fn with_decrement_on_draw(mut self, enabled: bool) -> Self {
        self.decrement_on_draw = enabled;
        self
    }

    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    /// 抽奖
    ///
    /// 逻辑:
    /// 1. 校验手机号、年卡号
    /// 2. 调用会员系统确认身份（超时或失败一律拒绝）
    /// 3. 查询该身份已有记录，有则直接返回（不再抽奖）
    /// 4. 事务内先写入记录（(phone, vipcard) 冲突时不写入），再读取 quantity > 0 的奖品加权抽取
    /// 5. 回填奖品 (可选扣减数量)，提交
    ///
    /// 事务的第一条语句就是写入，SQLite 下不会出现读锁升级写锁失败。
    /// 并发冲突（写入未生效或数据库忙）时重新查询已有记录，仍无结果则重试一次。
    pub async fn draw(&self, phone: &str, card: &str) -> AppResult<DrawOutcome> {
        let phone = phone.trim();
        let card = card.trim();
        if phone.is_empty() || card.is_empty() {
            return Ok(DrawOutcome::Rejected {
                reason: MSG_MISSING_IDENTITY.to_string(),
            });
        }

        if let Some(rejected) = self.verify_member(phone, card).await {
            return Ok(rejected);
        }

        if let Some(outcome) = Self::existing_outcome(&self.pool, phone, card).await? {
            return Ok(outcome);
        }

        for attempt in 1..=DRAW_ATTEMPTS {
            match self.draw_once(phone, card).await {
                Ok(Some(outcome)) => return Ok(outcome),
                Ok(None) => {
                    log::warn!("Draw for card {card} conflicted but no record is visible (attempt {attempt})");
                }
                Err(AppError::DatabaseError(err)) if is_concurrency_conflict(&err) => {
                    log::warn!("Concurrent draw for card {card} (attempt {attempt}): {err}");
                    if let Some(outcome) = Self::existing_outcome(&self.pool, phone, card).await? {
                        return Ok(outcome);
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Conflict(
            "Draw record conflict could not be resolved".into(),
        ))
    }

    /// 兑奖
    ///
    /// 逻辑:
    /// 1. 校验参数
    /// 2. 查找本自然年内的记录
    /// 3. 已兑奖直接失败；校验兑奖密码
    /// 4. 单条条件更新 (status = 0) 完成兑奖，更新行数为 0 说明被并发兑奖
    pub async fn redeem(&self, password: &str, phone: &str, card: &str) -> AppResult<RedeemOutcome> {
        let phone = phone.trim();
        let card = card.trim();
        if password.is_empty() || phone.is_empty() || card.is_empty() {
            return Ok(RedeemOutcome::Failure(MSG_MISSING_PARAMS.to_string()));
        }

        let (year_start, year_end) = year_window(&Local::now());

        let record = records::Entity::find()
            .filter(records::Column::Phone.eq(phone))
            .filter(records::Column::Vipcard.eq(card))
            .filter(records::Column::CreatedAt.gte(year_start))
            .filter(records::Column::CreatedAt.lt(year_end))
            .order_by_desc(records::Column::CreatedAt)
            .one(&self.pool)
            .await?;

        let Some(record) = record else {
            return Ok(RedeemOutcome::Failure(MSG_NOT_FOUND_OR_EXPIRED.to_string()));
        };

        let Ok(next_status) = record.status.claim() else {
            return Ok(RedeemOutcome::Failure(MSG_ALREADY_REDEEMED.to_string()));
        };

        let secret = settings::Entity::find()
            .filter(settings::Column::SettingKey.eq(REDEEM_PASSWORD_KEY))
            .one(&self.pool)
            .await?
            .and_then(|s| s.setting_value)
            .unwrap_or_default();

        if secret.is_empty() || secret != password {
            log::info!("Redeem rejected for record {}: incorrect password", record.id);
            return Ok(RedeemOutcome::Failure(MSG_WRONG_PASSWORD.to_string()));
        }

        let claimed = match self.claim_record(record.id, next_status).await {
            Err(err) if is_concurrency_conflict(&err) => {
                log::warn!("Concurrent redeem for record {}: {err}", record.id);
                self.claim_record(record.id, next_status).await?
            }
            other => other?,
        };

        if !claimed {
            return Ok(RedeemOutcome::Failure(MSG_ALREADY_REDEEMED.to_string()));
        }

        log::info!("Record {} redeemed", record.id);
        Ok(RedeemOutcome::Success)
    }

    // -----------------------------
    // 内部辅助方法
    // -----------------------------

    /// 会员校验未通过时返回拒绝结果
    async fn verify_member(&self, phone: &str, card: &str) -> Option<DrawOutcome> {
        let verified = tokio::time::timeout(self.oracle_timeout, self.oracle.verify(phone, card)).await;
        let reason = match verified {
            Ok(Ok(MemberStatus::Active)) => return None,
            Ok(Ok(MemberStatus::NotMember)) => {
                log::info!("Draw rejected: card {card} is not an active member");
                MSG_NOT_MEMBER
            }
            Ok(Err(e)) => {
                log::warn!("Member verification failed for card {card}: {e}");
                MSG_VERIFY_FAILED
            }
            Err(_) => {
                log::warn!(
                    "Member verification timed out after {:?} for card {card}",
                    self.oracle_timeout
                );
                MSG_VERIFY_FAILED
            }
        };
        Some(DrawOutcome::Rejected {
            reason: reason.to_string(),
        })
    }

    /// 条件更新 status = 0 的记录，返回是否更新成功
    async fn claim_record(&self, record_id: i32, next_status: RecordStatus) -> Result<bool, DbErr> {
        let result = records::Entity::update_many()
            .col_expr(records::Column::Status, Expr::value(next_status))
            .col_expr(records::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(records::Column::Id.eq(record_id))
            .filter(records::Column::Status.eq(RecordStatus::Unclaimed))
            .exec(&self.pool)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// 单次抽奖事务。返回 `None` 表示写入冲突但未查到已有记录。
    async fn draw_once(&self, phone: &str, card: &str) -> AppResult<Option<DrawOutcome>> {
        let txn = self.pool.begin().await?;

        let now = Utc::now();
        let inserted = records::Entity::insert(records::ActiveModel {
            prize_id: Set(None),
            phone: Set(phone.to_string()),
            vipcard: Set(card.to_string()),
            quantity: Set(1),
            record_type: Set(RecordType::Draw),
            status: Set(RecordStatus::Unclaimed),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([records::Column::Phone, records::Column::Vipcard])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        if inserted == 0 {
            let existing = Self::existing_outcome(&txn, phone, card).await?;
            txn.rollback().await?;
            return Ok(existing);
        }

        let Some(record) = records::Entity::find()
            .filter(records::Column::Phone.eq(phone))
            .filter(records::Column::Vipcard.eq(card))
            .one(&txn)
            .await?
        else {
            txn.rollback().await?;
            return Err(AppError::InternalError("draw record missing after insert".into()));
        };

        let available = prizes::Entity::find()
            .filter(prizes::Column::Quantity.gt(0))
            .order_by_asc(prizes::Column::Id)
            .all(&txn)
            .await?;

        let Some(prize) = self.select_and_secure_prize(&txn, available).await? else {
            log::warn!("Draw failed: no prize with remaining quantity");
            txn.rollback().await?;
            return Ok(Some(DrawOutcome::SystemError));
        };

        records::Entity::update_many()
            .col_expr(records::Column::PrizeId, Expr::value(prize.id))
            .filter(records::Column::Id.eq(record.id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        log::info!(
            "Draw won: record {} prize {} ({})",
            record.id,
            prize.id,
            prize.name
        );

        Ok(Some(DrawOutcome::Won {
            prize_name: prize.name,
            prize_image: prize.image,
            record_id: record.id,
            prize_id: prize.id,
            phone: record.phone,
            card: record.vipcard,
        }))
    }

    /// 选择奖品；开启扣减时使用条件更新 (quantity > 0)，扣减失败则剔除该奖品重选。
    async fn select_and_secure_prize(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        mut available: Vec<prizes::Model>,
    ) -> Result<Option<prizes::Model>, DbErr> {
        while !available.is_empty() {
            let chosen = {
                let mut rng = rand::rng();
                select_prize(&available, &mut rng).cloned()
            };
            let Some(chosen) = chosen else {
                return Ok(None);
            };

            if !self.decrement_on_draw {
                return Ok(Some(chosen));
            }

            let result = prizes::Entity::update_many()
                .col_expr(
                    prizes::Column::Quantity,
                    Expr::col(prizes::Column::Quantity).sub(1),
                )
                .col_expr(prizes::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(prizes::Column::Id.eq(chosen.id))
                .filter(prizes::Column::Quantity.gt(0))
                .exec(txn)
                .await?;

            if result.rows_affected == 1 {
                return Ok(Some(chosen));
            }

            // 已被并发抽空
            available.retain(|p| p.id != chosen.id);
        }

        Ok(None)
    }

    /// 该身份已有记录时的结果（不限时间）
    async fn existing_outcome<C: ConnectionTrait>(
        db: &C,
        phone: &str,
        card: &str,
    ) -> Result<Option<DrawOutcome>, DbErr> {
        let found = records::Entity::find()
            .filter(records::Column::Phone.eq(phone))
            .filter(records::Column::Vipcard.eq(card))
            .order_by_desc(records::Column::CreatedAt)
            .find_also_related(prizes::Entity)
            .one(db)
            .await?;

        Ok(found.map(|(record, prize)| {
            let prize_name = prize.map(|p| p.name).unwrap_or_default();
            match record.status {
                RecordStatus::Claimed => DrawOutcome::AlreadyClaimed {
                    prize_name,
                    record_id: record.id,
                    claimed_at: record.updated_at,
                },
                RecordStatus::Unclaimed => DrawOutcome::AlreadyWonUnclaimed {
                    prize_name,
                    record_id: record.id,
                    prize_id: record.prize_id,
                    won_at: record.created_at,
                },
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{file_test_pool, test_pool};
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use futures_util::future::join_all;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use sea_orm::{ActiveModelTrait, PaginatorTrait};
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum FakeBehaviour {
        Member,
        NotMember,
        Unreachable,
        Hang,
    }

    struct FakeOracle {
        behaviour: FakeBehaviour,
        calls: AtomicUsize,
    }

    impl FakeOracle {
        fn new(behaviour: FakeBehaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl IdentityOracle for FakeOracle {
        async fn verify(&self, _phone: &str, _card: &str) -> AppResult<MemberStatus> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                FakeBehaviour::Member => Ok(MemberStatus::Active),
                FakeBehaviour::NotMember => Ok(MemberStatus::NotMember),
                FakeBehaviour::Unreachable => {
                    Err(AppError::ExternalApiError("connection refused".into()))
                }
                FakeBehaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(MemberStatus::Active)
                }
            }
        }
    }

    fn prize(id: i32, quantity: i32) -> prizes::Model {
        let now = Utc::now();
        prizes::Model {
            id,
            name: format!("prize-{id}"),
            image: None,
            quantity,
            supplier: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn seed_prize(pool: &DatabaseConnection, name: &str, quantity: i32) -> prizes::Model {
        let now = Utc::now();
        prizes::ActiveModel {
            name: Set(name.to_string()),
            image: Set(Some("🎁".to_string())),
            quantity: Set(quantity),
            supplier: Set(Some("zoo".to_string())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(pool)
        .await
        .unwrap()
    }

    async fn set_secret(pool: &DatabaseConnection, secret: &str) {
        settings::Entity::update_many()
            .col_expr(settings::Column::SettingValue, Expr::value(secret))
            .filter(settings::Column::SettingKey.eq(REDEEM_PASSWORD_KEY))
            .exec(pool)
            .await
            .unwrap();
    }

    async fn record_count(pool: &DatabaseConnection) -> u64 {
        records::Entity::find().count(pool).await.unwrap()
    }

    async fn service() -> (LotteryService, DatabaseConnection) {
        let pool = test_pool().await;
        let svc = LotteryService::new(pool.clone(), FakeOracle::new(FakeBehaviour::Member));
        (svc, pool)
    }

    /// 固定返回最大值的随机源
    struct MaxRng;

    impl rand::RngCore for MaxRng {
        fn next_u32(&mut self) -> u32 {
            u32::MAX
        }
        fn next_u64(&mut self) -> u64 {
            u64::MAX
        }
        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0xff);
        }
    }

    /// 固定返回 0 的随机源
    struct ZeroRng;

    impl rand::RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0);
        }
    }

    #[test]
    fn test_select_empty_or_exhausted() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(select_prize(&[], &mut rng).is_none());
        assert!(select_prize(&[prize(1, 0), prize(2, 0)], &mut rng).is_none());
    }

    #[test]
    fn test_select_walks_by_ascending_id() {
        let list = vec![prize(9, 5), prize(2, 5), prize(4, 0)];
        assert_eq!(select_prize(&list, &mut ZeroRng).unwrap().id, 2);
        assert_eq!(select_prize(&list, &mut MaxRng).unwrap().id, 9);
    }

    #[test]
    fn test_select_converges_to_weights() {
        let list = vec![prize(1, 10), prize(2, 0), prize(3, 90)];
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 100_000;
        let mut counts = [0usize; 4];
        for _ in 0..trials {
            let picked = select_prize(&list, &mut rng).unwrap();
            counts[picked.id as usize] += 1;
        }

        assert_eq!(counts[2], 0);
        let first = counts[1] as f64 / trials as f64;
        let third = counts[3] as f64 / trials as f64;
        assert!((first - 0.10).abs() < 0.01, "got {first}");
        assert!((third - 0.90).abs() < 0.01, "got {third}");
    }

    #[test]
    fn test_year_window() {
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 8, 30, 0).unwrap();
        let (start, end) = year_window(&now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_draw_twice_returns_same_record() {
        let (svc, pool) = service().await;
        seed_prize(&pool, "卡通宝宝车", 3).await;
        seed_prize(&pool, "小本", 7).await;

        let first = svc.draw("555", "A1").await.unwrap();
        let DrawOutcome::Won {
            prize_name,
            record_id,
            prize_id,
            ..
        } = first.clone()
        else {
            panic!("expected Won, got {first:?}");
        };

        let second = svc.draw("555", "A1").await.unwrap();
        match second {
            DrawOutcome::AlreadyWonUnclaimed {
                prize_name: again,
                record_id: same_record,
                prize_id: same_prize,
                ..
            } => {
                assert_eq!(again, prize_name);
                assert_eq!(same_record, record_id);
                assert_eq!(same_prize, Some(prize_id));
            }
            other => panic!("expected AlreadyWonUnclaimed, got {other:?}"),
        }
        assert_eq!(record_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_identity_fields_are_trimmed() {
        let (svc, pool) = service().await;
        seed_prize(&pool, "小本", 1).await;

        assert!(matches!(
            svc.draw(" 555 ", "A1 ").await.unwrap(),
            DrawOutcome::Won { .. }
        ));
        assert!(matches!(
            svc.draw("555", "A1").await.unwrap(),
            DrawOutcome::AlreadyWonUnclaimed { .. }
        ));
    }

    #[tokio::test]
    async fn test_draw_rejects_missing_fields_without_calling_registry() {
        let pool = test_pool().await;
        let oracle = FakeOracle::new(FakeBehaviour::Member);
        let svc = LotteryService::new(pool.clone(), oracle.clone());

        let outcome = svc.draw("", "A1").await.unwrap();
        assert_eq!(
            outcome,
            DrawOutcome::Rejected {
                reason: MSG_MISSING_IDENTITY.to_string()
            }
        );
        assert_eq!(svc.draw("555", "  ").await.unwrap().status_code(), 2);
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_draw_rejects_non_member_and_unreachable_registry() {
        let pool = test_pool().await;
        seed_prize(&pool, "小本", 5).await;

        let svc = LotteryService::new(pool.clone(), FakeOracle::new(FakeBehaviour::NotMember));
        assert_eq!(
            svc.draw("555", "A1").await.unwrap(),
            DrawOutcome::Rejected {
                reason: MSG_NOT_MEMBER.to_string()
            }
        );

        let svc = LotteryService::new(pool.clone(), FakeOracle::new(FakeBehaviour::Unreachable));
        assert_eq!(
            svc.draw("555", "A1").await.unwrap(),
            DrawOutcome::Rejected {
                reason: MSG_VERIFY_FAILED.to_string()
            }
        );

        assert_eq!(record_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_registry_timeout_fails_safe() {
        let pool = test_pool().await;
        seed_prize(&pool, "小本", 5).await;
        let svc = LotteryService::new(pool.clone(), FakeOracle::new(FakeBehaviour::Hang))
            .with_oracle_timeout(Duration::from_millis(50));

        assert_eq!(
            svc.draw("555", "A1").await.unwrap(),
            DrawOutcome::Rejected {
                reason: MSG_VERIFY_FAILED.to_string()
            }
        );
        assert_eq!(record_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_draw_with_exhausted_inventory() {
        let (svc, pool) = service().await;
        seed_prize(&pool, "已抽完", 0).await;

        assert_eq!(svc.draw("555", "A1").await.unwrap(), DrawOutcome::SystemError);
        assert_eq!(record_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_draw_never_selects_zero_quantity_prize() {
        let (svc, pool) = service().await;
        seed_prize(&pool, "empty", 0).await;
        let only = seed_prize(&pool, "only", 1).await;

        for i in 0..20 {
            match svc.draw("555", &format!("card-{i}")).await.unwrap() {
                DrawOutcome::Won { prize_id, .. } => assert_eq!(prize_id, only.id),
                other => panic!("unexpected outcome {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_concurrent_first_draws_create_one_record() {
        let (svc, pool) = service().await;
        seed_prize(&pool, "卡通宝宝车", 3).await;
        seed_prize(&pool, "小本", 7).await;

        let outcomes = join_all((0..10).map(|_| svc.draw("555", "A1"))).await;
        let outcomes: Vec<DrawOutcome> = outcomes.into_iter().map(Result::unwrap).collect();

        let won: Vec<i32> = outcomes
            .iter()
            .filter_map(|o| match o {
                DrawOutcome::Won { record_id, .. } => Some(*record_id),
                _ => None,
            })
            .collect();
        assert_eq!(won.len(), 1);

        for o in &outcomes {
            match o {
                DrawOutcome::Won { .. } => {}
                DrawOutcome::AlreadyWonUnclaimed { record_id, .. } => {
                    assert_eq!(*record_id, won[0])
                }
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert_eq!(record_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_identity_unique_index_rejects_second_insert() {
        let pool = test_pool().await;
        let now = Utc::now();
        let new_record = || records::ActiveModel {
            phone: Set("555".to_string()),
            vipcard: Set("A1".to_string()),
            quantity: Set(1),
            record_type: Set(RecordType::Draw),
            status: Set(RecordStatus::Unclaimed),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        new_record().insert(&pool).await.unwrap();
        let err = new_record().insert(&pool).await.unwrap_err();
        assert!(is_unique_violation(&err), "unexpected error {err:?}");
    }

    #[tokio::test]
    async fn test_decrement_on_draw() {
        let pool = test_pool().await;
        let svc = LotteryService::new(pool.clone(), FakeOracle::new(FakeBehaviour::Member))
            .with_decrement_on_draw(true);
        let last = seed_prize(&pool, "最后一个", 1).await;

        assert!(matches!(
            svc.draw("555", "A1").await.unwrap(),
            DrawOutcome::Won { .. }
        ));
        let after = prizes::Entity::find_by_id(last.id)
            .one(&pool)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.quantity, 0);

        assert_eq!(svc.draw("556", "A2").await.unwrap(), DrawOutcome::SystemError);
    }

    #[tokio::test]
    async fn test_pool_quantity_untouched_by_default() {
        let (svc, pool) = service().await;
        let p = seed_prize(&pool, "小本", 2).await;

        svc.draw("555", "A1").await.unwrap();
        let after = prizes::Entity::find_by_id(p.id).one(&pool).await.unwrap().unwrap();
        assert_eq!(after.quantity, 2);
    }

    #[tokio::test]
    async fn test_worked_example() {
        let (svc, pool) = service().await;
        seed_prize(&pool, "卡通宝宝车", 3).await;
        seed_prize(&pool, "小本", 7).await;
        set_secret(&pool, "1234").await;

        let first = svc.draw("555", "A1").await.unwrap();
        assert_eq!(first.status_code(), 1);
        let second = svc.draw("555", "A1").await.unwrap();
        assert_eq!(second.status_code(), 3);
        match (&first, &second) {
            (
                DrawOutcome::Won { prize_name: a, .. },
                DrawOutcome::AlreadyWonUnclaimed { prize_name: b, .. },
            ) => assert_eq!(a, b),
            _ => unreachable!(),
        }

        assert_eq!(
            svc.redeem("1234", "555", "A1").await.unwrap(),
            RedeemOutcome::Success
        );
        assert_eq!(
            svc.redeem("1234", "555", "A1").await.unwrap(),
            RedeemOutcome::Failure(MSG_ALREADY_REDEEMED.to_string())
        );

        let third = svc.draw("555", "A1").await.unwrap();
        assert_eq!(third.status_code(), 4);
        assert_eq!(record_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_redeem_validation_and_password() {
        let (svc, pool) = service().await;
        seed_prize(&pool, "小本", 1).await;
        svc.draw("555", "A1").await.unwrap();

        assert_eq!(
            svc.redeem("", "555", "A1").await.unwrap(),
            RedeemOutcome::Failure(MSG_MISSING_PARAMS.to_string())
        );
        assert_eq!(
            svc.redeem("1234", "555", "B9").await.unwrap(),
            RedeemOutcome::Failure(MSG_NOT_FOUND_OR_EXPIRED.to_string())
        );
        // 兑奖密码未设置时永远失败
        assert_eq!(
            svc.redeem("1234", "555", "A1").await.unwrap(),
            RedeemOutcome::Failure(MSG_WRONG_PASSWORD.to_string())
        );

        set_secret(&pool, "1234").await;
        assert_eq!(
            svc.redeem("12345", "555", "A1").await.unwrap(),
            RedeemOutcome::Failure(MSG_WRONG_PASSWORD.to_string())
        );
        assert_eq!(
            svc.redeem("1234", "555", "A1").await.unwrap(),
            RedeemOutcome::Success
        );
    }

    #[tokio::test]
    async fn test_redeem_last_year_record_is_expired() {
        let (svc, pool) = service().await;
        let p = seed_prize(&pool, "小本", 1).await;
        set_secret(&pool, "1234").await;

        let (year_start, _) = year_window(&Local::now());
        let last_year = year_start - ChronoDuration::days(1);
        records::ActiveModel {
            prize_id: Set(Some(p.id)),
            phone: Set("555".to_string()),
            vipcard: Set("A1".to_string()),
            quantity: Set(1),
            record_type: Set(RecordType::Draw),
            status: Set(RecordStatus::Unclaimed),
            created_at: Set(last_year),
            updated_at: Set(last_year),
            ..Default::default()
        }
        .insert(&pool)
        .await
        .unwrap();

        for password in ["1234", "wrong"] {
            assert_eq!(
                svc.redeem(password, "555", "A1").await.unwrap(),
                RedeemOutcome::Failure(MSG_NOT_FOUND_OR_EXPIRED.to_string())
            );
        }

        // 抽奖查询不限年份，仍视为已中奖
        assert_eq!(svc.draw("555", "A1").await.unwrap().status_code(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_redeem_succeeds_once() {
        let (svc, pool) = service().await;
        seed_prize(&pool, "小本", 1).await;
        set_secret(&pool, "1234").await;
        svc.draw("555", "A1").await.unwrap();

        let (a, b) = tokio::join!(
            svc.redeem("1234", "555", "A1"),
            svc.redeem("1234", "555", "A1")
        );
        let mut outcomes = vec![a.unwrap(), b.unwrap()];
        outcomes.sort_by_key(|o| matches!(o, RedeemOutcome::Failure(_)));

        assert_eq!(
            outcomes,
            vec![
                RedeemOutcome::Success,
                RedeemOutcome::Failure(MSG_ALREADY_REDEEMED.to_string())
            ]
        );

        let record = records::Entity::find().one(&pool).await.unwrap().unwrap();
        assert_eq!(record.status, RecordStatus::Claimed);
    }

    async fn seed_record(
        pool: &DatabaseConnection,
        prize_id: i32,
        status: RecordStatus,
    ) -> records::Model {
        let now = Utc::now();
        records::ActiveModel {
            prize_id: Set(Some(prize_id)),
            phone: Set("555".to_string()),
            vipcard: Set("A1".to_string()),
            quantity: Set(1),
            record_type: Set(RecordType::Draw),
            status: Set(status),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_draw_once_resolves_identity_conflict_to_existing_record() {
        let (svc, pool) = service().await;
        let p = seed_prize(&pool, "小本", 5).await;
        let seeded = seed_record(&pool, p.id, RecordStatus::Unclaimed).await;

        match svc.draw_once("555", "A1").await.unwrap() {
            Some(DrawOutcome::AlreadyWonUnclaimed {
                record_id,
                prize_id,
                prize_name,
                ..
            }) => {
                assert_eq!(record_id, seeded.id);
                assert_eq!(prize_id, Some(p.id));
                assert_eq!(prize_name, "小本");
            }
            other => panic!("expected AlreadyWonUnclaimed, got {other:?}"),
        }
        assert_eq!(record_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_draw_once_conflict_with_claimed_record() {
        let (svc, pool) = service().await;
        let p = seed_prize(&pool, "小本", 5).await;
        let seeded = seed_record(&pool, p.id, RecordStatus::Claimed).await;

        match svc.draw_once("555", "A1").await.unwrap() {
            Some(DrawOutcome::AlreadyClaimed { record_id, .. }) => {
                assert_eq!(record_id, seeded.id)
            }
            other => panic!("expected AlreadyClaimed, got {other:?}"),
        }
        assert_eq!(record_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_claimed_outcome_reports_redemption_time() {
        let (svc, pool) = service().await;
        let p = seed_prize(&pool, "小本", 5).await;
        let won_at = Utc.with_ymd_and_hms(2026, 3, 1, 2, 0, 0).unwrap();
        let redeemed_at = Utc.with_ymd_and_hms(2026, 3, 2, 6, 30, 0).unwrap();
        let seeded = records::ActiveModel {
            prize_id: Set(Some(p.id)),
            phone: Set("555".to_string()),
            vipcard: Set("A1".to_string()),
            quantity: Set(1),
            record_type: Set(RecordType::Draw),
            status: Set(RecordStatus::Claimed),
            created_at: Set(won_at),
            updated_at: Set(redeemed_at),
            ..Default::default()
        }
        .insert(&pool)
        .await
        .unwrap();

        match svc.draw("555", "A1").await.unwrap() {
            DrawOutcome::AlreadyClaimed {
                record_id,
                claimed_at,
                ..
            } => {
                assert_eq!(record_id, seeded.id);
                assert_eq!(claimed_at, redeemed_at);
            }
            other => panic!("expected AlreadyClaimed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_concurrency_conflict_classification() {
        let pool = test_pool().await;
        let p = seed_prize(&pool, "小本", 1).await;
        seed_record(&pool, p.id, RecordStatus::Unclaimed).await;
        let now = Utc::now();
        let err = records::ActiveModel {
            phone: Set("555".to_string()),
            vipcard: Set("A1".to_string()),
            quantity: Set(1),
            record_type: Set(RecordType::Draw),
            status: Set(RecordStatus::Unclaimed),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&pool)
        .await
        .unwrap_err();

        assert!(is_concurrency_conflict(&err));
        assert!(is_concurrency_conflict(&DbErr::Custom(
            "error returned from database: (code: 5) database is locked".into()
        )));
        assert!(!is_concurrency_conflict(&DbErr::Custom("no such table: records".into())));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_first_draws_on_file_database() {
        let (pool, _dir) = file_test_pool(10).await;
        seed_prize(&pool, "卡通宝宝车", 3).await;
        seed_prize(&pool, "小本", 7).await;
        let svc = LotteryService::new(pool.clone(), FakeOracle::new(FakeBehaviour::Member));

        let rounds = 5;
        for round in 0..rounds {
            let card = format!("A{round}");
            let handles: Vec<_> = (0..10)
                .map(|_| {
                    let svc = svc.clone();
                    let card = card.clone();
                    tokio::spawn(async move { svc.draw("555", &card).await })
                })
                .collect();

            let mut won = Vec::new();
            let mut repeated = Vec::new();
            for outcome in join_all(handles).await {
                match outcome.unwrap().unwrap() {
                    DrawOutcome::Won { record_id, .. } => won.push(record_id),
                    DrawOutcome::AlreadyWonUnclaimed { record_id, .. } => repeated.push(record_id),
                    other => panic!("unexpected outcome {other:?}"),
                }
            }

            assert_eq!(won.len(), 1, "round {round}");
            assert_eq!(repeated.len(), 9, "round {round}");
            assert!(repeated.iter().all(|id| *id == won[0]));
        }

        assert_eq!(record_count(&pool).await, rounds);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_redeems_on_file_database() {
        let (pool, _dir) = file_test_pool(10).await;
        seed_prize(&pool, "小本", 1).await;
        set_secret(&pool, "1234").await;
        let svc = LotteryService::new(pool.clone(), FakeOracle::new(FakeBehaviour::Member));
        assert_eq!(svc.draw("555", "A1").await.unwrap().status_code(), 1);

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.redeem("1234", "555", "A1").await })
            })
            .collect();

        let outcomes: Vec<RedeemOutcome> = join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        let successes = outcomes
            .iter()
            .filter(|o| **o == RedeemOutcome::Success)
            .count();
        assert_eq!(successes, 1);
        assert!(outcomes.iter().all(|o| *o == RedeemOutcome::Success
            || *o == RedeemOutcome::Failure(MSG_ALREADY_REDEEMED.to_string())));

        let record = records::Entity::find().one(&pool).await.unwrap().unwrap();
        assert_eq!(record.status, RecordStatus::Claimed);
    }
}
