//! Equipment catalog operations

use super::Database;
use crate::error::Result;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// One golf ball record from the equipment catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GolfBall {
    pub id: String,
    pub country: String,
    pub manufacturer: String,
    pub usga_lot_num: String,
    pub pole_marking: String,
    pub pole1_web: String,
    pub colour: String,
    pub const_code: String,
    pub ball_specs: String,
    pub dimples: String,
    pub spin: String,
    pub pole_2: String,
    pub seam_marking: String,
    pub decision_number: String,
    pub image_url: String,
}

impl GolfBall {
    /// Stable id derived from the identifying fields, used when the catalog
    /// row carries none
    pub fn derived_id(&self) -> String {
        let mut hasher = Sha256::new();
        for field in [
            &self.manufacturer,
            &self.usga_lot_num,
            &self.pole_marking,
            &self.colour,
            &self.seam_marking,
            &self.pole_2,
        ] {
            hasher.update(field.as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize()).chars().take(16).collect()
    }

    /// Text embedded into the index's vector field
    pub fn embedding_text(&self) -> String {
        [
            self.manufacturer.as_str(),
            self.colour.as_str(),
            self.pole_marking.as_str(),
            self.pole_2.as_str(),
            self.seam_marking.as_str(),
            self.ball_specs.as_str(),
        ]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            country: row.get(1)?,
            manufacturer: row.get(2)?,
            usga_lot_num: row.get(3)?,
            pole_marking: row.get(4)?,
            pole1_web: row.get(5)?,
            colour: row.get(6)?,
            const_code: row.get(7)?,
            ball_specs: row.get(8)?,
            dimples: row.get(9)?,
            spin: row.get(10)?,
            pole_2: row.get(11)?,
            seam_marking: row.get(12)?,
            decision_number: row.get(13)?,
            image_url: row.get(14)?,
        })
    }
}

const SELECT_COLUMNS: &str = "id, country, manufacturer, usga_lot_num, pole_marking, pole1_web, \
     colour, const_code, ball_specs, dimples, spin, pole_2, seam_marking, decision_number, image_url";

impl Database {
    /// Distinct, non-empty manufacturer names
    pub fn get_manufacturers(&self) -> Result<Vec<String>> {
        let sql = "SELECT DISTINCT manufacturer FROM golf_balls \
                   WHERE manufacturer <> '' ORDER BY manufacturer";
        tracing::debug!("Getting manufacturers from database. Query: {}", sql);

        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let manufacturers = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(manufacturers)
    }

    /// Every record in the catalog
    pub fn get_golf_balls(&self) -> Result<Vec<GolfBall>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM golf_balls ORDER BY manufacturer, id",
            SELECT_COLUMNS
        ))?;
        let balls = stmt
            .query_map([], GolfBall::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(balls)
    }

    pub fn count_golf_balls(&self) -> Result<usize> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM golf_balls", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Insert or replace records; records without an id get a derived one
    pub fn insert_golf_balls(&self, balls: &[GolfBall]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR REPLACE INTO golf_balls ({}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                SELECT_COLUMNS
            ))?;
            for ball in balls {
                let id = if ball.id.trim().is_empty() {
                    ball.derived_id()
                } else {
                    ball.id.clone()
                };
                stmt.execute(params![
                    id,
                    ball.country,
                    ball.manufacturer.trim(),
                    ball.usga_lot_num,
                    ball.pole_marking,
                    ball.pole1_web,
                    ball.colour,
                    ball.const_code,
                    ball.ball_specs,
                    ball.dimples,
                    ball.spin,
                    ball.pole_2,
                    ball.seam_marking,
                    ball.decision_number,
                    ball.image_url,
                ])?;
            }
        }
        tx.commit()?;
        Ok(balls.len())
    }

    /// Load a CSV export of the catalog; headers match the field names
    pub fn import_golf_balls_csv(&self, path: impl AsRef<Path>) -> Result<usize> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_path(path.as_ref())?;

        let balls = reader
            .deserialize::<GolfBall>()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::info!(
            "Importing {} golf balls from {}",
            balls.len(),
            path.as_ref().display()
        );
        self.insert_golf_balls(&balls)
    }
}
