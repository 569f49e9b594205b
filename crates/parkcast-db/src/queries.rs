//! Query operations on the warehouse tables

use crate::schema::{HourlyTotalRow, ModelMetricsRow, PredictionRow, RawParkingRow};
use crate::{DbClient, DbResult};
use parkcast_core::{ForecastResult, HourlyTotal, RawReading, Timestamp};
use sqlx::{Postgres, QueryBuilder};
use tracing::{debug, instrument};

/// Rows per multi-row INSERT, keeping binds under the Postgres limit
const INSERT_CHUNK: usize = 1000;

impl DbClient {
    /// Create the schema and tables if they do not exist
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> DbResult<()> {
        for statement in self.tables().ddl() {
            sqlx::query(&statement).execute(self.pool()).await?;
        }
        debug!(schema = %self.tables().schema(), "warehouse schema ready");
        Ok(())
    }

    /// Append raw readings in one transaction
    #[instrument(skip(self, readings), fields(rows = readings.len()))]
    pub async fn insert_readings(&self, readings: &[RawReading]) -> DbResult<u64> {
        if readings.is_empty() {
            return Ok(0);
        }

        let rows: Vec<RawParkingRow> = readings.iter().map(RawParkingRow::from).collect();
        let table = self.tables().raw();
        let mut tx = self.pool().begin().await?;
        let mut inserted = 0;
        for chunk in rows.chunks(INSERT_CHUNK) {
            let result = readings_insert(&table, chunk).build().execute(&mut *tx).await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;

        debug!("Inserted {} raw readings into {}", inserted, table);
        Ok(inserted)
    }

    /// Free spaces summed per UTC hour, ascending, optionally from `since` on
    #[instrument(skip(self))]
    pub async fn hourly_totals(&self, since: Option<Timestamp>) -> DbResult<Vec<HourlyTotal>> {
        let sql = format!(
            r#"
            SELECT date_trunc('hour', "timestamp" AT TIME ZONE 'UTC') AT TIME ZONE 'UTC' AS hour,
                   SUM(free)::BIGINT AS total_free
            FROM {}
            WHERE free IS NOT NULL
              AND ($1::timestamptz IS NULL OR "timestamp" >= $1)
            GROUP BY 1
            ORDER BY 1 ASC
            "#,
            self.tables().raw()
        );

        let rows = sqlx::query_as::<_, HourlyTotalRow>(&sql)
            .bind(since)
            .fetch_all(self.pool())
            .await?;

        debug!("Retrieved {} hourly totals since {:?}", rows.len(), since);
        Ok(rows.into_iter().map(HourlyTotal::from).collect())
    }

    /// Write the metrics row and every prediction atomically
    #[instrument(skip(self, result), fields(model = %result.model_desc))]
    pub async fn insert_result(&self, result: &ForecastResult) -> DbResult<()> {
        let metrics = ModelMetricsRow::from(result);
        let predictions = PredictionRow::from_result(result);

        let mut tx = self.pool().begin().await?;
        sqlx::query(&format!(
            "INSERT INTO {} (run_at, train_points, mae, model_desc) VALUES ($1, $2, $3, $4)",
            self.tables().metrics()
        ))
        .bind(metrics.run_at)
        .bind(metrics.train_points)
        .bind(metrics.mae)
        .bind(&metrics.model_desc)
        .execute(&mut *tx)
        .await?;

        let table = self.tables().predictions();
        for chunk in predictions.chunks(INSERT_CHUNK) {
            predictions_insert(&table, chunk)
                .build()
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        debug!(
            "Stored run {} with {} predictions",
            metrics.run_at,
            predictions.len()
        );
        Ok(())
    }
}

fn readings_insert<'a>(table: &str, rows: &'a [RawParkingRow]) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "INSERT INTO {table} (\"timestamp\", parking_id, name, free, total, lat, lon) "
    ));
    builder.push_values(rows, |mut b, row| {
        b.push_bind(row.timestamp)
            .push_bind(row.parking_id.as_deref())
            .push_bind(row.name.as_deref())
            .push_bind(row.free)
            .push_bind(row.total)
            .push_bind(row.lat)
            .push_bind(row.lon);
    });
    builder
}

fn predictions_insert<'a>(table: &str, rows: &'a [PredictionRow]) -> QueryBuilder<'a, Postgres> {
    let mut builder =
        QueryBuilder::new(format!("INSERT INTO {table} (created_at, \"timestamp\", yhat) "));
    builder.push_values(rows, |mut b, row| {
        b.push_bind(row.created_at)
            .push_bind(row.timestamp)
            .push_bind(row.yhat);
    });
    builder
}
