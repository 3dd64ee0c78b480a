use crate::catalog::Catalog;
use crate::db::connection::Database;
use crate::domain::projection::Projection;
use crate::domain::rent_match::MatchTier;
use crate::domain::{Decision, EnrichedRecord, ListingRecord};
use crate::errors::StoreError;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogMeta {
    pub fingerprint: String,
    pub record_count: usize,
    pub model_id: String,
    pub built_at: DateTime<Utc>,
}

/// Replaces the stored catalog in one transaction: readers of the database
/// see either the previous run or this one.
pub fn save_catalog(db: &Database, catalog: &Catalog, model_id: &str) -> Result<(), StoreError> {
    let built_at = Utc::now();

    db.with_conn(|conn| {
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM properties", [])?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO properties (
                    position, id, title, location, price_raw, price_value, bhk, area,
                    rent, match_tier, comparables_used, interest_rate, down_payment_percent,
                    down_payment, loan_amount, monthly_emi,
                    total_tax_buy, total_tax_rent, final_buying_cost, final_renting_cost,
                    decision
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8,
                    ?9, ?10, ?11, ?12, ?13,
                    ?14, ?15, ?16,
                    ?17, ?18, ?19, ?20,
                    ?21
                )
                "#,
            )?;

            for (position, r) in catalog.records().iter().enumerate() {
                let l = &r.listing;
                let p = &r.projection;
                stmt.execute(params![
                    position as i64,
                    l.id as i64,
                    l.title,
                    l.location,
                    l.price_raw,
                    l.price_value,
                    l.bhk.map(i64::from),
                    l.area,
                    r.imputed_rent,
                    r.match_tier.as_str(),
                    r.comparables_used as i64,
                    r.interest_rate,
                    r.down_payment_fraction,
                    p.down_payment,
                    p.loan_amount,
                    p.monthly_emi,
                    p.total_tax_buy,
                    p.total_tax_rent,
                    p.final_buying_cost,
                    p.final_renting_cost,
                    r.decision().as_str(),
                ])?;
            }
        }

        tx.execute(
            r#"
            INSERT INTO catalog_meta (id, fingerprint, record_count, model_id, built_at)
            VALUES (1, ?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                fingerprint = excluded.fingerprint,
                record_count = excluded.record_count,
                model_id = excluded.model_id,
                built_at = excluded.built_at
            "#,
            params![
                catalog.fingerprint(),
                catalog.len() as i64,
                model_id,
                built_at
            ],
        )?;

        tx.commit()?;
        Ok(())
    })
}

pub fn load_meta(db: &Database) -> Result<Option<CatalogMeta>, StoreError> {
    db.with_conn(|conn| {
        let meta = conn
            .query_row(
                "SELECT fingerprint, record_count, model_id, built_at FROM catalog_meta WHERE id = 1",
                [],
                |row| {
                    Ok(CatalogMeta {
                        fingerprint: row.get(0)?,
                        record_count: row.get::<_, i64>(1)? as usize,
                        model_id: row.get(2)?,
                        built_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(meta)
    })
}

/// Loads the stored catalog and checks it against its own metadata:
/// record count, fingerprint, and every stored decision against the one
/// re-derived from the stored costs.
pub fn load_catalog(db: &Database) -> Result<(Catalog, CatalogMeta), StoreError> {
    let meta = load_meta(db)?
        .ok_or_else(|| StoreError::ArtifactMismatch("catalog metadata missing".into()))?;

    let records = db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            r#"
            SELECT
                id,                    -- 0
                title,                 -- 1
                location,              -- 2
                price_raw,             -- 3
                price_value,           -- 4
                bhk,                   -- 5
                area,                  -- 6
                rent,                  -- 7
                match_tier,            -- 8
                comparables_used,      -- 9
                interest_rate,         -- 10
                down_payment_percent,  -- 11
                down_payment,          -- 12
                loan_amount,           -- 13
                monthly_emi,           -- 14
                total_tax_buy,         -- 15
                total_tax_rent,        -- 16
                final_buying_cost,     -- 17
                final_renting_cost,    -- 18
                decision               -- 19
            FROM properties
            ORDER BY position
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let tier: String = row.get(8)?;
            let stored_decision: String = row.get(19)?;
            let record = EnrichedRecord {
                listing: ListingRecord {
                    id: row.get::<_, i64>(0)? as u64,
                    title: row.get(1)?,
                    location: row.get(2)?,
                    price_raw: row.get(3)?,
                    price_value: row.get(4)?,
                    bhk: row.get::<_, Option<i64>>(5)?.map(|b| b as u32),
                    area: row.get(6)?,
                },
                imputed_rent: row.get(7)?,
                match_tier: MatchTier::Exact,
                comparables_used: row.get::<_, i64>(9)? as usize,
                interest_rate: row.get(10)?,
                down_payment_fraction: row.get(11)?,
                projection: Projection {
                    down_payment: row.get(12)?,
                    loan_amount: row.get(13)?,
                    monthly_emi: row.get(14)?,
                    total_tax_buy: row.get(15)?,
                    total_tax_rent: row.get(16)?,
                    final_buying_cost: row.get(17)?,
                    final_renting_cost: row.get(18)?,
                },
            };
            Ok((record, tier, stored_decision))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (mut record, tier, stored_decision) = row?;
            record.match_tier = MatchTier::parse(&tier).ok_or_else(|| {
                StoreError::Corrupt(format!("record {}: unknown match tier '{tier}'", record.id()))
            })?;
            let stored: Decision = stored_decision
                .parse()
                .map_err(|e| StoreError::Corrupt(format!("record {}: {e}", record.id())))?;
            if stored != record.decision() {
                return Err(StoreError::ArtifactMismatch(format!(
                    "record {}: stored decision {stored} disagrees with its costs",
                    record.id()
                )));
            }
            records.push(record);
        }
        Ok(records)
    })?;

    if records.len() != meta.record_count {
        return Err(StoreError::ArtifactMismatch(format!(
            "metadata lists {} records, table has {}",
            meta.record_count,
            records.len()
        )));
    }

    let catalog = Catalog::new(records);
    if catalog.fingerprint() != meta.fingerprint {
        return Err(StoreError::ArtifactMismatch(
            "catalog rows do not match the recorded fingerprint".into(),
        ));
    }

    Ok((catalog, meta))
}
