//! Inspection persistence
//!
//! Inspections live in three tables: `inspections` holds the header fields,
//! `inspection_items` and `equipment_info` hold the child collections ordered
//! by `position`. Saving an existing inspection replaces both collections.
//! Partial edits go through [`lock`] so two editors never overwrite each
//! other's changes.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{
    clamp_severity, ChecklistItemState, EquipmentRecord, InspectionDetails, InspectionDraft,
    InspectionListing, InspectionRecord, ServiceType,
};

/// Database row for an inspection header
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
struct InspectionRow {
    id: Uuid,
    customer_name: String,
    address: String,
    technician_name: String,
    inspection_date: NaiveDate,
    notes: String,
    service_types: Vec<String>,
    selected_suggestions: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Database row for a checklist item
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
struct ItemRow {
    position: i32,
    item_name: String,
    completed: bool,
    severity: i16,
    notes: String,
}

/// Database row for an equipment record
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
struct EquipmentRow {
    position: i32,
    service_type: String,
    brand: String,
    model_number: String,
    serial_number: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ListingRow {
    id: Uuid,
    customer_name: String,
    address: String,
    technician_name: String,
    inspection_date: NaiveDate,
    service_types: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct Timestamps {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_service_types(raw: &[String]) -> Vec<ServiceType> {
    raw.iter()
        .filter_map(|s| match s.parse::<ServiceType>() {
            Ok(service_type) => Some(service_type),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping stored service type");
                None
            }
        })
        .collect()
}

fn service_type_strings(service_types: &[ServiceType]) -> Vec<String> {
    service_types.iter().map(|s| s.as_str().to_string()).collect()
}

impl From<ListingRow> for InspectionListing {
    fn from(row: ListingRow) -> Self {
        Self {
            id: row.id,
            customer_name: row.customer_name,
            address: row.address,
            technician_name: row.technician_name,
            inspection_date: row.inspection_date,
            service_types: parse_service_types(&row.service_types),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<ItemRow> for ChecklistItemState {
    fn from(row: ItemRow) -> Self {
        Self {
            item_name: row.item_name,
            completed: row.completed,
            severity: clamp_severity(row.severity.into()),
            notes: row.notes,
        }
    }
}

fn item_rows(items: &[ChecklistItemState]) -> Vec<ItemRow> {
    items
        .iter()
        .enumerate()
        .map(|(position, item)| ItemRow {
            position: position as i32,
            item_name: item.item_name.clone(),
            completed: item.completed,
            severity: item.severity.into(),
            notes: item.notes.clone(),
        })
        .collect()
}

fn equipment_rows(equipment: &[EquipmentRecord]) -> Vec<EquipmentRow> {
    equipment
        .iter()
        .enumerate()
        .map(|(position, record)| EquipmentRow {
            position: position as i32,
            service_type: record.service_type.as_str().to_string(),
            brand: record.brand.clone(),
            model_number: record.model_number.clone(),
            serial_number: record.serial_number.clone(),
        })
        .collect()
}

/// Rows come back ordered by position.
fn assemble(row: InspectionRow, items: Vec<ItemRow>, equipment: Vec<EquipmentRow>) -> InspectionRecord {
    let equipment = equipment
        .into_iter()
        .filter_map(|e| match e.service_type.parse::<ServiceType>() {
            Ok(service_type) => Some(EquipmentRecord {
                service_type,
                brand: e.brand,
                model_number: e.model_number,
                serial_number: e.serial_number,
            }),
            Err(err) => {
                tracing::warn!(
                    inspection_id = %row.id,
                    position = e.position,
                    error = %err,
                    "Skipping equipment record with unknown service type"
                );
                None
            }
        })
        .collect();

    InspectionRecord {
        id: row.id,
        draft: InspectionDraft {
            details: InspectionDetails {
                customer_name: row.customer_name,
                address: row.address,
                technician_name: row.technician_name,
                inspection_date: row.inspection_date,
                general_notes: row.notes,
            },
            service_types: parse_service_types(&row.service_types),
            items: items.into_iter().map(Into::into).collect(),
            equipment,
            selected_suggestions: row.selected_suggestions,
        },
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

async fn insert_children(
    tx: &mut Transaction<'_, Postgres>,
    inspection_id: Uuid,
    draft: &InspectionDraft,
) -> Result<(), sqlx::Error> {
    let items = item_rows(&draft.items);
    if !items.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO inspection_items (inspection_id, position, item_name, completed, severity, notes)
            SELECT $1, * FROM UNNEST($2::int4[], $3::text[], $4::bool[], $5::int2[], $6::text[])
            "#,
        )
        .bind(inspection_id)
        .bind(items.iter().map(|r| r.position).collect::<Vec<_>>())
        .bind(items.iter().map(|r| r.item_name.clone()).collect::<Vec<_>>())
        .bind(items.iter().map(|r| r.completed).collect::<Vec<_>>())
        .bind(items.iter().map(|r| r.severity).collect::<Vec<_>>())
        .bind(items.iter().map(|r| r.notes.clone()).collect::<Vec<_>>())
        .execute(&mut **tx)
        .await?;
    }

    let equipment = equipment_rows(&draft.equipment);
    if !equipment.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO equipment_info (inspection_id, position, service_type, brand, model_number, serial_number)
            SELECT $1, * FROM UNNEST($2::int4[], $3::text[], $4::text[], $5::text[], $6::text[])
            "#,
        )
        .bind(inspection_id)
        .bind(equipment.iter().map(|r| r.position).collect::<Vec<_>>())
        .bind(equipment.iter().map(|r| r.service_type.clone()).collect::<Vec<_>>())
        .bind(equipment.iter().map(|r| r.brand.clone()).collect::<Vec<_>>())
        .bind(equipment.iter().map(|r| r.model_number.clone()).collect::<Vec<_>>())
        .bind(equipment.iter().map(|r| r.serial_number.clone()).collect::<Vec<_>>())
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Insert a new inspection with its items and equipment.
pub async fn create(db: &PgPool, draft: InspectionDraft) -> Result<InspectionRecord, sqlx::Error> {
    let id = Uuid::new_v4();
    let details = &draft.details;

    let mut tx = db.begin().await?;

    let stamps = sqlx::query_as::<_, Timestamps>(
        r#"
        INSERT INTO inspections (id, customer_name, address, technician_name, inspection_date,
                                 notes, service_types, selected_suggestions)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(&details.customer_name)
    .bind(&details.address)
    .bind(&details.technician_name)
    .bind(details.inspection_date)
    .bind(&details.general_notes)
    .bind(service_type_strings(&draft.service_types))
    .bind(&draft.selected_suggestions)
    .fetch_one(&mut *tx)
    .await?;

    insert_children(&mut tx, id, &draft).await?;
    tx.commit().await?;

    tracing::info!(
        inspection_id = %id,
        items = draft.items.len(),
        equipment = draft.equipment.len(),
        equipment_filled = draft.equipment.iter().filter(|e| !e.is_blank()).count(),
        "Inspection created"
    );

    Ok(InspectionRecord {
        id,
        draft,
        created_at: stamps.created_at,
        updated_at: stamps.updated_at,
    })
}

const SELECT_INSPECTION: &str = r#"
    SELECT id, customer_name, address, technician_name, inspection_date, notes,
           service_types, selected_suggestions, created_at, updated_at
    FROM inspections
    WHERE id = $1
"#;

/// Same row as [`SELECT_INSPECTION`], locked until the transaction ends.
const LOCK_INSPECTION: &str = r#"
    SELECT id, customer_name, address, technician_name, inspection_date, notes,
           service_types, selected_suggestions, created_at, updated_at
    FROM inspections
    WHERE id = $1
    FOR UPDATE
"#;

async fn load_children(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<(Vec<ItemRow>, Vec<EquipmentRow>), sqlx::Error> {
    let items = sqlx::query_as::<_, ItemRow>(
        r#"
        SELECT position, item_name, completed, severity, notes
        FROM inspection_items
        WHERE inspection_id = $1
        ORDER BY position
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    let equipment = sqlx::query_as::<_, EquipmentRow>(
        r#"
        SELECT position, service_type, brand, model_number, serial_number
        FROM equipment_info
        WHERE inspection_id = $1
        ORDER BY position
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok((items, equipment))
}

/// Update the header and rewrite both child collections. `None` when the
/// inspection does not exist.
async fn write_draft(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    draft: &InspectionDraft,
) -> Result<Option<Timestamps>, sqlx::Error> {
    let details = &draft.details;

    let stamps = sqlx::query_as::<_, Timestamps>(
        r#"
        UPDATE inspections
        SET customer_name = $2, address = $3, technician_name = $4, inspection_date = $5,
            notes = $6, service_types = $7, selected_suggestions = $8, updated_at = NOW()
        WHERE id = $1
        RETURNING created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(&details.customer_name)
    .bind(&details.address)
    .bind(&details.technician_name)
    .bind(details.inspection_date)
    .bind(&details.general_notes)
    .bind(service_type_strings(&draft.service_types))
    .bind(&draft.selected_suggestions)
    .fetch_optional(&mut **tx)
    .await?;

    let Some(stamps) = stamps else {
        return Ok(None);
    };

    sqlx::query("DELETE FROM inspection_items WHERE inspection_id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM equipment_info WHERE inspection_id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;

    insert_children(tx, id, draft).await?;
    Ok(Some(stamps))
}

/// Overwrite an existing inspection. Both child collections are deleted and
/// re-inserted. Returns `None` when the inspection does not exist.
pub async fn replace(
    db: &PgPool,
    id: Uuid,
    draft: InspectionDraft,
) -> Result<Option<InspectionRecord>, sqlx::Error> {
    let mut tx = db.begin().await?;
    let Some(stamps) = write_draft(&mut tx, id, &draft).await? else {
        return Ok(None);
    };
    tx.commit().await?;

    tracing::info!(inspection_id = %id, items = draft.items.len(), "Inspection replaced");

    Ok(Some(InspectionRecord {
        id,
        draft,
        created_at: stamps.created_at,
        updated_at: stamps.updated_at,
    }))
}

pub async fn fetch(db: &PgPool, id: Uuid) -> Result<Option<InspectionRecord>, sqlx::Error> {
    let mut conn = db.acquire().await?;

    let row = sqlx::query_as::<_, InspectionRow>(SELECT_INSPECTION)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let (items, equipment) = load_children(&mut conn, id).await?;
    Ok(Some(assemble(row, items, equipment)))
}

/// An inspection opened for a read-modify-write.
///
/// The header row stays locked until [`LockedInspection::save`] commits.
/// Concurrent edits of the same inspection queue behind the lock. Dropping
/// the value rolls back and releases it.
pub struct LockedInspection {
    id: Uuid,
    tx: Transaction<'static, Postgres>,
}

impl LockedInspection {
    pub async fn save(mut self, draft: InspectionDraft) -> Result<InspectionRecord, sqlx::Error> {
        // the lock keeps the row from being deleted under us
        let stamps = write_draft(&mut self.tx, self.id, &draft)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        self.tx.commit().await?;

        tracing::info!(inspection_id = %self.id, items = draft.items.len(), "Inspection edited");

        Ok(InspectionRecord {
            id: self.id,
            draft,
            created_at: stamps.created_at,
            updated_at: stamps.updated_at,
        })
    }
}

/// Load an inspection and lock it for editing. `None` when it does not exist.
pub async fn lock(
    db: &PgPool,
    id: Uuid,
) -> Result<Option<(LockedInspection, InspectionRecord)>, sqlx::Error> {
    let mut tx = db.begin().await?;

    let row = sqlx::query_as::<_, InspectionRow>(LOCK_INSPECTION)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let (items, equipment) = load_children(&mut tx, id).await?;
    let record = assemble(row, items, equipment);

    Ok(Some((LockedInspection { id, tx }, record)))
}

/// Newest first. Returns the page and the total count.
pub async fn list(
    db: &PgPool,
    limit: u32,
    offset: u32,
) -> Result<(Vec<InspectionListing>, u64), sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inspections")
        .fetch_one(db)
        .await?;

    let rows = sqlx::query_as::<_, ListingRow>(
        r#"
        SELECT id, customer_name, address, technician_name, inspection_date,
               service_types, created_at, updated_at
        FROM inspections
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit as i64)
    .bind(offset as i64)
    .fetch_all(db)
    .await?;

    Ok((rows.into_iter().map(Into::into).collect(), total as u64))
}

/// Child rows go with the inspection through `ON DELETE CASCADE`.
pub async fn delete(db: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM inspections WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;

    if result.rows_affected() > 0 {
        tracing::info!(inspection_id = %id, "Inspection deleted");
    }

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::checklist::derive_checklist;
    use pretty_assertions::assert_eq;

    fn header(record: &InspectionRecord) -> InspectionRow {
        let details = &record.draft.details;
        InspectionRow {
            id: record.id,
            customer_name: details.customer_name.clone(),
            address: details.address.clone(),
            technician_name: details.technician_name.clone(),
            inspection_date: details.inspection_date,
            notes: details.general_notes.clone(),
            service_types: service_type_strings(&record.draft.service_types),
            selected_suggestions: record.draft.selected_suggestions.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    fn record() -> InspectionRecord {
        let service_types = vec![ServiceType::Furnace, ServiceType::HotWaterTank];
        let mut items = derive_checklist(&service_types);
        items[0].completed = true;
        items[1].severity = 7;
        items[1].notes = "flame sensor dirty".into();

        let mut furnace = EquipmentRecord::blank(ServiceType::Furnace);
        furnace.brand = "Lennox".into();
        furnace.serial_number = "5809K1234".into();

        let now = Utc::now();
        InspectionRecord {
            id: Uuid::new_v4(),
            draft: InspectionDraft {
                details: InspectionDetails {
                    customer_name: "Sam Ortiz".into(),
                    address: "401 Birch Rd".into(),
                    technician_name: "Avery".into(),
                    inspection_date: NaiveDate::from_ymd_opt(2024, 10, 2).unwrap(),
                    general_notes: String::new(),
                },
                service_types,
                items,
                // the blank record survives the round trip
                equipment: vec![furnace, EquipmentRecord::blank(ServiceType::HotWaterTank)],
                selected_suggestions: vec!["Powered anode rod".into(), "Leak detector sensor".into()],
            },
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn record_survives_row_round_trip() {
        let original = record();
        let rebuilt = assemble(
            header(&original),
            item_rows(&original.draft.items),
            equipment_rows(&original.draft.equipment),
        );
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn rows_keep_positions() {
        let original = record();
        let positions: Vec<i32> = item_rows(&original.draft.items)
            .iter()
            .map(|r| r.position)
            .collect();
        assert_eq!(positions, (0..original.draft.items.len() as i32).collect::<Vec<_>>());
        assert_eq!(equipment_rows(&original.draft.equipment)[1].service_type, "hot_water_tank");
    }

    #[test]
    fn unknown_stored_values_are_tolerated() {
        let mut row = header(&record());
        row.service_types = vec!["furnace".into(), "boiler".into()];

        let items = vec![ItemRow {
            position: 0,
            item_name: "Check flue".into(),
            completed: false,
            severity: 14,
            notes: String::new(),
        }];
        let equipment = vec![EquipmentRow {
            position: 0,
            service_type: "boiler".into(),
            brand: "Weil".into(),
            model_number: String::new(),
            serial_number: String::new(),
        }];

        let rebuilt = assemble(row, items, equipment);
        assert_eq!(rebuilt.draft.service_types, vec![ServiceType::Furnace]);
        assert_eq!(rebuilt.draft.items[0].severity, 10);
        assert!(rebuilt.draft.equipment.is_empty());
    }

    #[test]
    fn edit_lock_reads_the_same_columns() {
        assert!(LOCK_INSPECTION.trim_end().ends_with("FOR UPDATE"));
        assert_eq!(
            LOCK_INSPECTION.replace("FOR UPDATE", "").trim(),
            SELECT_INSPECTION.trim()
        );
    }

    #[tokio::test]
    #[ignore] // Requires Postgres at DATABASE_URL
    async fn concurrent_edits_are_serialised() {
        let url = std::env::var("DATABASE_URL").unwrap();
        let db = PgPool::connect(&url).await.unwrap();
        sqlx::migrate!("./migrations").run(&db).await.unwrap();

        let id = create(&db, record().draft).await.unwrap().id;

        let (first, mut first_record) = lock(&db, id).await.unwrap().unwrap();

        let second_db = db.clone();
        let second = tokio::spawn(async move {
            // waits on the row lock until the first edit commits
            let (guard, mut current) = lock(&second_db, id).await.unwrap().unwrap();
            current.draft.items[2].notes = "blower wheel caked".into();
            guard.save(current.draft).await.unwrap()
        });

        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        first_record.draft.items[0].notes = "filter replaced".into();
        first.save(first_record.draft).await.unwrap();

        let saved = second.await.unwrap();
        assert_eq!(saved.draft.items[0].notes, "filter replaced");
        assert_eq!(saved.draft.items[2].notes, "blower wheel caked");

        assert!(delete(&db, id).await.unwrap());
    }
}
