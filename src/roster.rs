// In-memory raid rosters and boss strategy notes.
//
// Process-local only: everything is lost on restart.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LookupError;
use crate::format::Role;

pub const DEFAULT_MAX_SIZE: usize = 20;
const MAX_ATTENDANCE: u8 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Normal,
    #[default]
    Heroic,
    Mythic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemberStatus {
    Confirmed,
    Tentative,
    Declined,
    #[default]
    NoResponse,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaidMember {
    pub id: String,
    pub name: String,
    pub class: String,
    pub spec: String,
    pub role: Role,
    pub realm: String,
    pub status: MemberStatus,
    pub notes: String,
    pub main_raider: bool,
    /// Percent, 0-100.
    pub attendance: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaidRoster {
    pub id: String,
    pub name: String,
    pub date: NaiveDate,
    pub difficulty: Difficulty,
    pub max_size: usize,
    pub members: Vec<RaidMember>,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoleCount {
    pub total: usize,
    pub confirmed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoleSummary {
    pub tanks: RoleCount,
    pub healers: RoleCount,
    pub dps: RoleCount,
}

impl RaidRoster {
    pub fn is_full(&self) -> bool {
        self.members.len() >= self.max_size
    }

    /// Member and confirmed counts per role. Unknown roles are not counted.
    pub fn role_summary(&self) -> RoleSummary {
        let mut summary = RoleSummary::default();
        for member in &self.members {
            let count = match member.role {
                Role::Tank => &mut summary.tanks,
                Role::Healer => &mut summary.healers,
                Role::Dps => &mut summary.dps,
                Role::Unknown => continue,
            };
            count.total += 1;
            if member.status == MemberStatus::Confirmed {
                count.confirmed += 1;
            }
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyNote {
    pub id: String,
    pub boss: String,
    pub phase: String,
    pub content: String,
    pub priority: Priority,
    pub assigned_to: Vec<String>,
}

// ── Request bodies ────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterInput {
    pub name: String,
    pub date: Option<NaiveDate>,
    pub difficulty: Option<Difficulty>,
    pub max_size: Option<usize>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInput {
    pub name: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub spec: String,
    pub role: Role,
    #[serde(default)]
    pub realm: String,
    pub status: Option<MemberStatus>,
    pub notes: Option<String>,
    pub main_raider: Option<bool>,
    pub attendance: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyInput {
    pub boss: String,
    #[serde(default)]
    pub phase: String,
    pub content: String,
    pub priority: Option<Priority>,
    pub assigned_to: Option<Vec<String>>,
}

fn require(field: &str, value: &str) -> Result<String, LookupError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LookupError::InvalidInput(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

impl MemberInput {
    fn into_member(self, id: String) -> Result<RaidMember, LookupError> {
        let attendance = self.attendance.unwrap_or(0);
        if attendance > MAX_ATTENDANCE {
            return Err(LookupError::InvalidInput(
                "attendance must be between 0 and 100".into(),
            ));
        }
        Ok(RaidMember {
            id,
            name: require("name", &self.name)?,
            class: self.class,
            spec: self.spec,
            role: self.role,
            realm: self.realm,
            status: self.status.unwrap_or_default(),
            notes: self.notes.unwrap_or_default(),
            main_raider: self.main_raider.unwrap_or(false),
            attendance,
        })
    }
}

impl StrategyInput {
    fn into_note(self, id: String) -> Result<StrategyNote, LookupError> {
        Ok(StrategyNote {
            id,
            boss: require("boss", &self.boss)?,
            phase: self.phase,
            content: require("content", &self.content)?,
            priority: self.priority.unwrap_or_default(),
            assigned_to: self.assigned_to.unwrap_or_default(),
        })
    }
}

fn validate_max_size(max_size: usize) -> Result<usize, LookupError> {
    if max_size == 0 {
        return Err(LookupError::InvalidInput("maxSize must be at least 1".into()));
    }
    Ok(max_size)
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn roster_not_found() -> LookupError {
    LookupError::NotFound("Roster".into())
}

// ── Store ─────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct RosterState {
    rosters: Vec<RaidRoster>,
    strategies: Vec<StrategyNote>,
}

/// Thread-safe in-memory roster store.
#[derive(Debug, Clone, Default)]
pub struct RosterStore {
    inner: Arc<Mutex<RosterState>>,
}

impl RosterStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RosterState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn list_rosters(&self) -> Vec<RaidRoster> {
        self.state().rosters.clone()
    }

    pub fn get_roster(&self, id: &str) -> Result<RaidRoster, LookupError> {
        self.state()
            .rosters
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(roster_not_found)
    }

    pub fn create_roster(&self, input: RosterInput) -> Result<RaidRoster, LookupError> {
        let roster = RaidRoster {
            id: new_id(),
            name: require("name", &input.name)?,
            date: input.date.unwrap_or_else(|| Utc::now().date_naive()),
            difficulty: input.difficulty.unwrap_or_default(),
            max_size: validate_max_size(input.max_size.unwrap_or(DEFAULT_MAX_SIZE))?,
            members: Vec::new(),
            notes: input.notes.unwrap_or_default(),
        };
        self.state().rosters.push(roster.clone());
        Ok(roster)
    }

    /// Replace a roster's settings, keeping its members.
    pub fn update_roster(&self, id: &str, input: RosterInput) -> Result<RaidRoster, LookupError> {
        let name = require("name", &input.name)?;
        let mut state = self.state();
        let roster = state
            .rosters
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(roster_not_found)?;

        let max_size = validate_max_size(input.max_size.unwrap_or(roster.max_size))?;
        if max_size < roster.members.len() {
            return Err(LookupError::InvalidInput(format!(
                "maxSize {max_size} is below the current {} members",
                roster.members.len()
            )));
        }

        roster.name = name;
        roster.max_size = max_size;
        if let Some(date) = input.date {
            roster.date = date;
        }
        if let Some(difficulty) = input.difficulty {
            roster.difficulty = difficulty;
        }
        if let Some(notes) = input.notes {
            roster.notes = notes;
        }
        Ok(roster.clone())
    }

    pub fn delete_roster(&self, id: &str) -> bool {
        let mut state = self.state();
        let before = state.rosters.len();
        state.rosters.retain(|r| r.id != id);
        state.rosters.len() != before
    }

    pub fn add_member(&self, roster_id: &str, input: MemberInput) -> Result<RaidMember, LookupError> {
        let member = input.into_member(new_id())?;
        let mut state = self.state();
        let roster = state
            .rosters
            .iter_mut()
            .find(|r| r.id == roster_id)
            .ok_or_else(roster_not_found)?;
        if roster.is_full() {
            return Err(LookupError::InvalidInput(format!(
                "roster is full ({} members)",
                roster.max_size
            )));
        }
        roster.members.push(member.clone());
        Ok(member)
    }

    pub fn update_member(
        &self,
        roster_id: &str,
        member_id: &str,
        input: MemberInput,
    ) -> Result<RaidMember, LookupError> {
        let member = input.into_member(member_id.to_string())?;
        let mut state = self.state();
        let roster = state
            .rosters
            .iter_mut()
            .find(|r| r.id == roster_id)
            .ok_or_else(roster_not_found)?;
        let slot = roster
            .members
            .iter_mut()
            .find(|m| m.id == member_id)
            .ok_or_else(|| LookupError::NotFound("Member".into()))?;
        *slot = member.clone();
        Ok(member)
    }

    pub fn remove_member(&self, roster_id: &str, member_id: &str) -> Result<(), LookupError> {
        let mut state = self.state();
        let roster = state
            .rosters
            .iter_mut()
            .find(|r| r.id == roster_id)
            .ok_or_else(roster_not_found)?;
        let before = roster.members.len();
        roster.members.retain(|m| m.id != member_id);
        if roster.members.len() == before {
            return Err(LookupError::NotFound("Member".into()));
        }
        Ok(())
    }

    pub fn list_strategies(&self) -> Vec<StrategyNote> {
        self.state().strategies.clone()
    }

    pub fn create_strategy(&self, input: StrategyInput) -> Result<StrategyNote, LookupError> {
        let note = input.into_note(new_id())?;
        self.state().strategies.push(note.clone());
        Ok(note)
    }

    pub fn update_strategy(&self, id: &str, input: StrategyInput) -> Result<StrategyNote, LookupError> {
        let note = input.into_note(id.to_string())?;
        let mut state = self.state();
        let slot = state
            .strategies
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| LookupError::NotFound("Strategy".into()))?;
        *slot = note.clone();
        Ok(note)
    }

    pub fn delete_strategy(&self, id: &str) -> bool {
        let mut state = self.state();
        let before = state.strategies.len();
        state.strategies.retain(|s| s.id != id);
        state.strategies.len() != before
    }
}
