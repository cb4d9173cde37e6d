//! Cascading selection chain with stale-fetch suppression
//!
//! Drives ordered dropdown fields where each field's options depend on the
//! values chosen above it. Changing a field clears everything below it
//! synchronously and bumps a per-field generation counter; option fetches
//! resolve against that counter, so a resolution raced by a newer upstream
//! change is discarded without touching the field.

// ─────────────────────────────────────────────────────────────────────────────
// Definitions
// ─────────────────────────────────────────────────────────────────────────────

/// How one field obtains its options, given the values chosen upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPlan {
    /// Options come from an async fetch the caller must issue
    Fetch,
    /// Options are known without fetching
    Static(Vec<String>),
    /// Field does not apply for these upstream values
    Inactive,
}

/// Definition of one chained field.
///
/// `plan` is consulted with the values of every field above this one
/// (index order, `None` where nothing is chosen) whenever any of them change.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub key: &'static str,
    pub plan: fn(&[Option<String>]) -> FieldPlan,
}

// ─────────────────────────────────────────────────────────────────────────────
// Runtime State
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle phase of one field's options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPhase {
    /// Nothing to show and nothing in flight
    Idle,
    /// A fetch directive is outstanding
    Loading,
    /// Options are present
    Loaded,
    /// The last fetch for the current generation failed
    Error(String),
}

/// Current state of one chained field.
#[derive(Debug, Clone)]
pub struct SelectionField {
    key: &'static str,
    value: Option<String>,
    options: Vec<String>,
    phase: FieldPhase,
    generation: u64,
    active: bool,
}

impl SelectionField {
    fn new(key: &'static str) -> Self {
        Self {
            key,
            value: None,
            options: Vec::new(),
            phase: FieldPhase::Idle,
            generation: 0,
            active: false,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn phase(&self) -> &FieldPhase {
        &self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the field applies under the current upstream values.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_loading(&self) -> bool {
        self.phase == FieldPhase::Loading
    }

    fn has_value(&self) -> bool {
        self.value.as_deref().is_some_and(|v| !v.is_empty())
    }

    fn blocks_completion(&self) -> bool {
        matches!(self.phase, FieldPhase::Loading | FieldPhase::Error(_))
    }
}

/// Instruction to fetch options for one field.
///
/// Carries the generation the eventual resolution must present, plus a copy
/// of the upstream values the fetch should be parameterized with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchDirective {
    pub index: usize,
    pub key: &'static str,
    pub generation: u64,
    pub upstream: Vec<Option<String>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Chain
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered fields with cascade-on-change semantics.
#[derive(Debug, Clone)]
pub struct FieldChain {
    defs: Vec<FieldDef>,
    fields: Vec<SelectionField>,
}

impl FieldChain {
    /// Build a chain and plan every field from an all-empty state.
    ///
    /// Returned directives cover fields whose initial plan is a fetch.
    pub fn new(defs: Vec<FieldDef>) -> (Self, Vec<FetchDirective>) {
        let fields = defs.iter().map(|d| SelectionField::new(d.key)).collect();
        let mut chain = Self { defs, fields };
        let directives = chain.replan_from(0);
        (chain, directives)
    }

    /// Choose a value for one field.
    ///
    /// Every downstream field is cleared and replanned before this returns,
    /// so no stale option or selection survives into the next render.
    pub fn select(&mut self, index: usize, value: impl Into<String>) -> Vec<FetchDirective> {
        if index >= self.fields.len() {
            return Vec::new();
        }
        self.fields[index].value = Some(value.into());
        self.replan_from(index + 1)
    }

    /// Clear one field's value, cascading like any other upstream change.
    pub fn reset(&mut self, index: usize) -> Vec<FetchDirective> {
        if index >= self.fields.len() {
            return Vec::new();
        }
        self.fields[index].value = None;
        self.replan_from(index + 1)
    }

    /// Apply a fetch resolution.
    ///
    /// Returns `false` when the resolution is stale (its generation no longer
    /// matches the field's), in which case nothing changes.
    pub fn resolve(
        &mut self,
        index: usize,
        generation: u64,
        result: Result<Vec<String>, String>,
    ) -> bool {
        let Some(field) = self.fields.get_mut(index) else {
            return false;
        };
        if field.generation != generation {
            return false;
        }

        match result {
            Ok(options) => {
                field.options = options;
                field.phase = FieldPhase::Loaded;
            }
            Err(message) => {
                field.phase = FieldPhase::Error(message);
            }
        }
        true
    }

    /// Whether every requirement for submission is met.
    ///
    /// True when the first field holds a value, every active field holds a
    /// value, and no field is mid-fetch or errored.
    pub fn is_complete(&self) -> bool {
        let root_chosen = self.fields.first().is_some_and(|f| f.has_value());
        root_chosen
            && self.fields.iter().all(|f| !f.active || f.has_value())
            && !self.fields.iter().any(|f| f.blocks_completion())
    }

    pub fn field(&self, index: usize) -> Option<&SelectionField> {
        self.fields.get(index)
    }

    pub fn fields(&self) -> &[SelectionField] {
        &self.fields
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.key == key)
    }

    /// Chosen value of the field with this key.
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.fields.iter().find(|f| f.key == key)?.value()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Clear and replan every field from `start` down, in index order.
    ///
    /// Generations bump unconditionally so that any fetch still in flight for
    /// a replanned field can no longer land.
    fn replan_from(&mut self, start: usize) -> Vec<FetchDirective> {
        let mut directives = Vec::new();

        for index in start..self.fields.len() {
            let upstream: Vec<Option<String>> = self.fields[..index]
                .iter()
                .map(|f| f.value.clone())
                .collect();
            let plan = (self.defs[index].plan)(&upstream);

            let field = &mut self.fields[index];
            field.generation += 1;
            field.value = None;
            field.options.clear();

            match plan {
                FieldPlan::Fetch => {
                    field.active = true;
                    field.phase = FieldPhase::Loading;
                    directives.push(FetchDirective {
                        index,
                        key: field.key,
                        generation: field.generation,
                        upstream,
                    });
                }
                FieldPlan::Static(options) => {
                    field.active = true;
                    field.options = options;
                    field.phase = FieldPhase::Loaded;
                }
                FieldPlan::Inactive => {
                    field.active = false;
                    field.phase = FieldPhase::Idle;
                }
            }
        }

        directives
    }
}
