use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::{PromoCodeRepository, PromoRedemption};
use crate::domain::promo::PromoCode;
use crate::schema::{promo_code_usages, promo_codes};

use super::models::{NewPromoUsageRow, PromoCodeRow};

diesel::define_sql_function! {
    fn upper(x: diesel::sql_types::Text) -> diesel::sql_types::Text;
}

pub struct DieselPromoCodeRepository {
    pool: DbPool,
}

impl DieselPromoCodeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn insert(&self, promo: &PromoCode) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::insert_into(promo_codes::table)
            .values(&PromoCodeRow::from(promo))
            .execute(&mut conn)?;
        Ok(())
    }
}

fn user_redemptions_in(
    conn: &mut PgConnection,
    promo_id: Uuid,
    user_id: Uuid,
) -> Result<i32, DomainError> {
    let used = promo_code_usages::table
        .filter(promo_code_usages::promo_code_id.eq(promo_id))
        .filter(promo_code_usages::user_id.eq(user_id))
        .select(promo_code_usages::times_used)
        .first::<i32>(conn)
        .optional()?;
    Ok(used.unwrap_or(0))
}

/// Consumes one use of the promo inside the caller's transaction.
///
/// The global counter is bumped with a conditional UPDATE, so two
/// transactions racing for the last use cannot both succeed: the loser
/// re-evaluates the predicate after the winner commits and updates nothing.
/// That row lock also serializes the per-user check that follows.
pub(crate) fn consume_in(
    conn: &mut PgConnection,
    redemption: &PromoRedemption,
) -> Result<(), DomainError> {
    let bumped = diesel::update(
        promo_codes::table
            .filter(promo_codes::id.eq(redemption.promo_id))
            .filter(
                promo_codes::usage_limit
                    .is_null()
                    .or(promo_codes::times_used.lt(promo_codes::usage_limit.assume_not_null())),
            ),
    )
    .set(promo_codes::times_used.eq(promo_codes::times_used + 1))
    .returning(promo_codes::usage_limit_per_user)
    .get_result::<Option<i32>>(conn)
    .optional()?;

    let Some(per_user_limit) = bumped else {
        return Err(DomainError::LimitRace);
    };

    if let Some(limit) = per_user_limit {
        if user_redemptions_in(conn, redemption.promo_id, redemption.user_id)? >= limit {
            return Err(DomainError::LimitRace);
        }
    }

    diesel::insert_into(promo_code_usages::table)
        .values(&NewPromoUsageRow {
            promo_code_id: redemption.promo_id,
            user_id: redemption.user_id,
            times_used: 1,
        })
        .on_conflict((promo_code_usages::promo_code_id, promo_code_usages::user_id))
        .do_update()
        .set((
            promo_code_usages::times_used.eq(promo_code_usages::times_used + 1),
            promo_code_usages::updated_at.eq(Utc::now()),
        ))
        .execute(conn)?;
    Ok(())
}

impl PromoCodeRepository for DieselPromoCodeRepository {
    fn find_by_code(&self, code: &str) -> Result<Option<PromoCode>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = promo_codes::table
            .filter(upper(promo_codes::code).eq(PromoCode::normalize(code)))
            .select(PromoCodeRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(PromoCode::try_from).transpose()
    }

    fn user_redemptions(&self, promo_id: Uuid, user_id: Uuid) -> Result<i32, DomainError> {
        let mut conn = self.pool.get()?;
        user_redemptions_in(&mut conn, promo_id, user_id)
    }

    fn consume(&self, redemption: &PromoRedemption) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| consume_in(conn, redemption))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bigdecimal::BigDecimal;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::DieselPromoCodeRepository;
    use crate::domain::errors::DomainError;
    use crate::domain::ports::{PromoCodeRepository, PromoRedemption};
    use crate::domain::promo::{DiscountType, PromoCode};
    use crate::infrastructure::test_db::setup_db;

    fn promo(code: &str, usage_limit: Option<i32>, per_user: Option<i32>) -> PromoCode {
        PromoCode {
            id: Uuid::new_v4(),
            code: code.to_string(),
            discount_type: DiscountType::Percentage,
            discount_value: BigDecimal::from(15),
            minimum_order_amount: BigDecimal::from(0),
            max_discount_amount: Some(BigDecimal::from(75)),
            usage_limit,
            usage_limit_per_user: per_user,
            start_date: Utc::now() - Duration::days(1),
            end_date: Utc::now() + Duration::days(7),
            restaurant_id: None,
            first_time_only: false,
            is_active: true,
            times_used: 0,
        }
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn find_by_code_ignores_case_and_whitespace() {
        let (_container, pool) = setup_db().await;
        let repo = DieselPromoCodeRepository::new(pool);
        let stored = promo("Festive15", None, None);
        repo.insert(&stored).expect("insert");

        let found = repo
            .find_by_code("  festive15 ")
            .expect("find")
            .expect("promo exists");
        assert_eq!(found.id, stored.id);
        assert_eq!(found.discount_type, DiscountType::Percentage);
        assert!(repo.find_by_code("FESTIVE16").expect("find").is_none());
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn concurrent_consumers_never_exceed_usage_limit() {
        let (_container, pool) = setup_db().await;
        let repo = Arc::new(DieselPromoCodeRepository::new(pool));
        let stored = promo("RUSH", Some(5), None);
        repo.insert(&stored).expect("insert");

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let repo = repo.clone();
                let promo_id = stored.id;
                std::thread::spawn(move || {
                    repo.consume(&PromoRedemption {
                        promo_id,
                        user_id: Uuid::new_v4(),
                    })
                })
            })
            .collect();
        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .collect();

        let ok = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok, 5);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, DomainError::LimitRace)));
        let after = repo.find_by_code("rush").expect("find").expect("promo");
        assert_eq!(after.times_used, 5);
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn per_user_limit_is_enforced_and_rolls_back_global_count() {
        let (_container, pool) = setup_db().await;
        let repo = DieselPromoCodeRepository::new(pool);
        let stored = promo("ONCEONLY", None, Some(1));
        repo.insert(&stored).expect("insert");
        let redemption = PromoRedemption {
            promo_id: stored.id,
            user_id: Uuid::new_v4(),
        };

        repo.consume(&redemption).expect("first use");
        let err = repo.consume(&redemption).unwrap_err();

        assert!(matches!(err, DomainError::LimitRace));
        assert_eq!(
            repo.user_redemptions(stored.id, redemption.user_id)
                .expect("count"),
            1
        );
        let after = repo.find_by_code("onceonly").expect("find").expect("promo");
        assert_eq!(after.times_used, 1);
    }
}
