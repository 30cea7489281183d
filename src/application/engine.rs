//! Engine facade - the main entry point for hosts
//!
//! Owns the clock, the shared variable store, the asset table, the host
//! hooks and the list manager, and exposes the tick/start/skip surface the
//! rest of a game builds on.

use std::collections::BTreeMap;

use crate::application::api::{ApiError, TickReport};
use crate::assets::ListRepository;
use crate::hooks::{HostHooks, NullHooks};
use crate::parser::parse_script;
use crate::runtime::manager::{GameState, ListManager};
use crate::runtime::EngineCtx;
use crate::storage::Snapshot;
use crate::types::directive::Directive;
use crate::types::list::{ActionList, ListSource};
use crate::types::value::{ParamSet, VarStore, VarValue};

pub struct Engine {
    manager: ListManager,
    vars: VarStore,
    assets: BTreeMap<String, ActionList>,
    hooks: Box<dyn HostHooks>,
    now: f64,
    out: Vec<Directive>,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_hooks(Box::new(NullHooks))
    }

    pub fn with_hooks(hooks: Box<dyn HostHooks>) -> Self {
        Self {
            manager: ListManager::new(),
            vars: VarStore::new(),
            assets: BTreeMap::new(),
            hooks,
            now: 0.0,
            out: Vec::new(),
        }
    }

    /// Parse a script, register it as an asset and start it immediately.
    pub fn from_script(src: &str) -> Result<Self, ApiError> {
        let mut engine = Self::new();
        let id = engine.register_script(src)?;
        engine.start_asset(&id)?;
        Ok(engine)
    }

    /// Validate and register a hand-built list asset. Returns its id.
    pub fn register_asset(&mut self, mut list: ActionList) -> Result<String, ApiError> {
        list.validate()
            .map_err(|e| ApiError::invalid(e.to_string()))?;
        let id = list.id.clone();
        list.source = ListSource::Asset { id: id.clone() };
        self.assets.insert(id.clone(), list);
        Ok(id)
    }

    /// Parse and register a script asset. Returns its id.
    pub fn register_script(&mut self, src: &str) -> Result<String, ApiError> {
        let list = parse_script(src)?;
        self.register_asset(list)
    }

    /// Pull every asset out of a repository into the engine's table.
    pub async fn load_assets(&mut self, repo: &dyn ListRepository) -> Result<usize, ApiError> {
        let ids = repo
            .list_ids()
            .await
            .map_err(|e| ApiError::asset(e.to_string()))?;
        let mut loaded = 0;
        for id in ids {
            let list = repo
                .load(&id)
                .await
                .map_err(|e| ApiError::asset(e.to_string()))?;
            self.register_asset(list)?;
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Start an embedded list from its first action.
    pub fn start(&mut self, list: ActionList) -> Result<(), ApiError> {
        self.start_from(list, 0)
    }

    /// Start an embedded list from an explicit index.
    pub fn start_from(&mut self, list: ActionList, start_index: usize) -> Result<(), ApiError> {
        list.validate()
            .map_err(|e| ApiError::invalid(e.to_string()))?;
        let add_to_skip_queue = list.is_skippable();
        let now = self.now;
        let mut ctx = EngineCtx {
            now,
            vars: &mut self.vars,
            out: &mut self.out,
            assets: &self.assets,
            hooks: self.hooks.as_mut(),
        };
        self.manager
            .add_list(list, add_to_skip_queue, start_index, &mut ctx);
        Ok(())
    }

    /// Start a registered asset from its first action.
    pub fn start_asset(&mut self, id: &str) -> Result<(), ApiError> {
        self.start_asset_with_params(id, ParamSet::new())
    }

    /// Start a registered asset with dispatch-time parameter overrides laid
    /// over the asset's defaults.
    pub fn start_asset_with_params(
        &mut self,
        id: &str,
        overrides: ParamSet,
    ) -> Result<(), ApiError> {
        let Some(template) = self.assets.get(id) else {
            return Err(ApiError::asset(format!("asset '{id}' is not registered")));
        };
        let mut list = template.clone();
        for (name, value) in overrides {
            list.params.insert(name, value);
        }
        self.start_from(list, 0)
    }

    /// Advance the clock and drive every running list once.
    pub fn tick(&mut self, dt: f32) -> TickReport {
        self.now += f64::from(dt.max(0.0));
        let now = self.now;
        let mut ctx = EngineCtx {
            now,
            vars: &mut self.vars,
            out: &mut self.out,
            assets: &self.assets,
            hooks: self.hooks.as_mut(),
        };
        self.manager.tick(&mut ctx);
        TickReport {
            state: self.game_state(),
            directives: std::mem::take(&mut self.out),
        }
    }

    /// The user-facing "skip the whole cutscene" request. Returns the
    /// directives emitted by the instant replay.
    pub fn skip_all(&mut self) -> Vec<Directive> {
        let now = self.now;
        let mut ctx = EngineCtx {
            now,
            vars: &mut self.vars,
            out: &mut self.out,
            assets: &self.assets,
            hooks: self.hooks.as_mut(),
        };
        self.manager.end_cutscene(&mut ctx);
        std::mem::take(&mut self.out)
    }

    /// Force-end one list with the normal end-of-list transitions.
    pub fn end_list(&mut self, id: &str) {
        let now = self.now;
        let mut ctx = EngineCtx {
            now,
            vars: &mut self.vars,
            out: &mut self.out,
            assets: &self.assets,
            hooks: self.hooks.as_mut(),
        };
        self.manager.end_list(id, &mut ctx);
    }

    pub fn game_state(&self) -> GameState {
        self.manager.game_state(self.hooks.as_ref())
    }

    pub fn is_gameplay_blocked(&self) -> bool {
        self.manager.is_gameplay_blocked()
    }

    pub fn is_list_running(&self, id: &str) -> bool {
        self.manager.is_list_running(id)
    }

    pub fn are_lists_running(&self) -> bool {
        self.manager.are_lists_running()
    }

    pub fn set_cutscene_forced(&mut self, forced: bool) {
        self.manager.set_cutscene_forced(forced);
    }

    /// Record a resume point so an in-progress dialogue list can be
    /// interrupted and picked up again later.
    pub fn override_conversation(
        &mut self,
        conversation: impl Into<String>,
        list_id: &str,
        resume_index: usize,
    ) {
        self.manager
            .override_conversation(conversation, list_id, resume_index);
    }

    /// Resume the overridden list from its recorded index.
    pub fn resume_conversation(&mut self) {
        let now = self.now;
        let mut ctx = EngineCtx {
            now,
            vars: &mut self.vars,
            out: &mut self.out,
            assets: &self.assets,
            hooks: self.hooks.as_mut(),
        };
        self.manager.resume_conversation(&mut ctx);
    }

    pub fn end_conversation(&mut self) {
        self.manager.end_conversation();
    }

    pub fn active_conversation(&self) -> Option<&str> {
        self.manager.active_conversation()
    }

    /// Cancel everything synchronously (scene teardown).
    pub fn kill_all(&mut self) {
        self.manager.kill_all();
        self.out.clear();
    }

    pub fn get_var(&self, name: &str) -> Option<String> {
        self.vars.get(name).map(|v| v.to_string())
    }

    pub fn set_var(&mut self, name: &str, value: &str) {
        self.vars
            .insert(name.to_string(), VarValue::parse(value));
    }

    pub fn vars(&self) -> &VarStore {
        &self.vars
    }

    pub fn vars_mut(&mut self) -> &mut VarStore {
        &mut self.vars
    }

    pub fn clock(&self) -> f64 {
        self.now
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            vars: self.vars.clone(),
            clock: self.now,
        }
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        self.vars = snapshot.vars;
        self.now = snapshot.clock;
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
