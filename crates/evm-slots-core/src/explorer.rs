//! The slot labeling engine.
//!
//! Walks every declared variable in a [`StorageLayout`], expanding mappings
//! by trying candidate keys and arrays by trying candidate indices, greedily
//! consuming observed slots until either the declared variables are
//! exhausted or the explore budget is spent. Pure and synchronous: it never
//! suspends and it never returns an error, it degrades (see module docs on
//! [`crate::error`]).

use std::collections::{BTreeMap, HashSet, VecDeque};

use alloy_primitives::{B256, U256};
use itertools::Itertools;
use tracing::debug;

use crate::decode::{classify_primitive, decode_long_length, decode_primitive, decode_short_bytes, PrimitiveKind};
use crate::layout::{BytesKind, StorageLayout, TypeDef};
use crate::path::{compose_expression, AccessRecord, DecodedValue, PathSegment, SlotValue, VariableKind};
use crate::preimage::{Preimage, PreimagePool, PreimageType};
use crate::slot::{dyn_array_data_base, element_location, long_bytes_data_base, mapping_slot, struct_field_slot};

/// Tunable bounds on the Explorer's search. See spec §6.4 for defaults.
#[derive(Debug, Clone, Copy)]
pub struct ExploreConfig {
    pub max_mapping_depth: u32,
    pub max_explored_states: u32,
    pub max_dyn_array_sweep: u64,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self { max_mapping_depth: 4, max_explored_states: 5000, max_dyn_array_sweep: 16 }
    }
}

/// One slot's pre/post raw value, as seen by the transaction.
#[derive(Debug, Clone, Copy)]
pub struct ObservedSlot {
    /// Defaults to zero for slots first written on a newly created account,
    /// where the diff oracle reports no pre-image (storage reads as zero).
    pub current: B256,
    pub next: Option<B256>,
}

/// The set of slots a transaction touched on one account, keyed by raw slot.
#[derive(Debug, Clone, Default)]
pub struct ObservedSlots(BTreeMap<B256, ObservedSlot>);

impl ObservedSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, slot: B256, value: ObservedSlot) {
        self.0.insert(slot, value);
    }

    pub fn get(&self, slot: &B256) -> Option<&ObservedSlot> {
        self.0.get(slot)
    }

    pub fn contains(&self, slot: &B256) -> bool {
        self.0.contains_key(slot)
    }

    pub fn keys(&self) -> impl Iterator<Item = &B256> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The two outputs of one [`explore`] run.
#[derive(Debug, Clone, Default)]
pub struct ExploreOutput {
    pub variables: Vec<crate::path::LabeledVariable>,
    pub unexplored: Vec<crate::path::LabeledVariable>,
}

struct Budget {
    remaining: u32,
}

impl Budget {
    fn spend(&mut self, n: u32) -> bool {
        if self.remaining >= n {
            self.remaining -= n;
            true
        } else {
            self.remaining = 0;
            false
        }
    }

    fn exhausted(&self) -> bool {
        self.remaining == 0
    }
}

struct Ctx<'a> {
    layout: &'a StorageLayout,
    observed: &'a ObservedSlots,
    pool: &'a PreimagePool,
    config: &'a ExploreConfig,
}

fn u256_to_b256(v: U256) -> B256 {
    B256::from(v.to_be_bytes::<32>())
}

fn slot_value(ctx: &Ctx<'_>, slot: B256, decode: impl Fn(&B256) -> Option<DecodedValue>) -> Option<(SlotValue, Option<SlotValue>, bool)> {
    let observed = ctx.observed.get(&slot)?;
    let current = SlotValue::new(observed.current, decode(&observed.current));
    let next = observed.next.map(|n| SlotValue::new(n, decode(&n)));
    let modified = observed.next.is_some_and(|n| n != observed.current);
    Some((current, next, modified))
}

/// Runs the Explorer over every declared variable, producing labeled access
/// records and a residual set of slots that couldn't be attributed to any
/// declared variable.
pub fn explore(layout: &StorageLayout, observed: &ObservedSlots, pool: &PreimagePool, config: &ExploreConfig) -> ExploreOutput {
    let ctx = Ctx { layout, observed, pool, config };
    let mut budget = Budget { remaining: config.max_explored_states };
    let mut explored_slots: HashSet<B256> = HashSet::new();
    let mut variables = Vec::new();

    for var in &layout.storage {
        let mut records = Vec::new();
        explore_value(
            &ctx,
            &mut budget,
            &mut explored_slots,
            var.slot,
            var.offset,
            &var.type_id,
            &[],
            &mut records,
        );
        if records.is_empty() {
            continue;
        }
        for record in &mut records {
            record.full_expression = format!("{}{}", var.label, record.full_expression);
        }
        let type_name = layout.type_of(&var.type_id).map(type_label).unwrap_or_else(|| var.type_id.clone());
        let kind = layout.type_of(&var.type_id).map(variable_kind).unwrap_or(VariableKind::Primitive);
        variables.push(crate::path::LabeledVariable { name: var.label.clone(), type_name, kind, trace: records });
    }

    if budget.exhausted() {
        debug!(target: "evm_slots_core::explorer", max = config.max_explored_states, "explore budget exhausted");
    }

    let unexplored = observed
        .keys()
        .filter(|s| !explored_slots.contains(*s))
        .map(|slot| {
            let observed_slot = observed.get(slot).expect("slot came from observed.keys()");
            let current = SlotValue::new(observed_slot.current, None);
            let next = observed_slot.next.map(|n| SlotValue::new(n, None));
            let modified = next.as_ref().is_some_and(|n| n.hex != observed_slot.current);
            crate::path::LabeledVariable {
                name: format!("slot_{slot}"),
                type_name: "unknown".to_string(),
                kind: VariableKind::Primitive,
                trace: vec![AccessRecord {
                    slots: vec![*slot],
                    path: vec![],
                    full_expression: format!("slot_{slot}"),
                    current,
                    next,
                    modified,
                    note: Some("Could not label this slot access because no layout was found.".to_string()),
                }],
            }
        })
        .collect();

    ExploreOutput { variables, unexplored }
}

fn type_label(def: &TypeDef) -> String {
    match def {
        TypeDef::Primitive { name, .. } => name.clone(),
        TypeDef::Bytes { kind: BytesKind::Bytes } => "bytes".to_string(),
        TypeDef::Bytes { kind: BytesKind::String } => "string".to_string(),
        TypeDef::StaticArray { base_type_id, length, .. } => format!("{base_type_id}[{length}]"),
        TypeDef::DynamicArray { base_type_id } => format!("{base_type_id}[]"),
        TypeDef::Mapping { key_type_id, value_type_id } => format!("mapping({key_type_id} => {value_type_id})"),
        TypeDef::Struct { .. } => "struct".to_string(),
    }
}

fn variable_kind(def: &TypeDef) -> VariableKind {
    match def {
        TypeDef::Primitive { .. } => VariableKind::Primitive,
        TypeDef::Bytes { .. } => VariableKind::Bytes,
        TypeDef::StaticArray { .. } => VariableKind::StaticArray,
        TypeDef::DynamicArray { .. } => VariableKind::DynamicArray,
        TypeDef::Mapping { .. } => VariableKind::Mapping,
        TypeDef::Struct { .. } => VariableKind::Struct,
    }
}

/// Declared key type of a mapping, resolved to the shape the preimage pool
/// tags candidates with.
fn declared_preimage_type(layout: &StorageLayout, type_id: &str) -> PreimageType {
    match layout.type_of(type_id) {
        Some(TypeDef::Primitive { name, .. }) => match classify_primitive(name) {
            PrimitiveKind::Address => PreimageType::Address,
            PrimitiveKind::Bool => PreimageType::Bool,
            PrimitiveKind::Uint | PrimitiveKind::Enum => PreimageType::Uint,
            PrimitiveKind::Int => PreimageType::Int,
            PrimitiveKind::FixedBytes => PreimageType::FixedBytes,
        },
        Some(TypeDef::Bytes { kind: BytesKind::String }) => PreimageType::String,
        Some(TypeDef::Bytes { kind: BytesKind::Bytes }) => PreimageType::Bytes,
        _ => PreimageType::Unknown,
    }
}

fn byte_width_of(layout: &StorageLayout, type_id: &str) -> u32 {
    match layout.type_of(type_id) {
        Some(TypeDef::Primitive { byte_width, .. }) => u32::from(*byte_width),
        Some(TypeDef::StaticArray { length, stride, .. }) => {
            let total = length * u64::from(*stride);
            if total <= 32 { total as u32 } else { (total as u32).div_ceil(32) * 32 }
        }
        Some(TypeDef::Struct { byte_width, .. }) => *byte_width,
        _ => 32,
    }
}

/// Dispatches on `type_id`'s resolved shape and recurses. `path` accumulates
/// the segments leading to this value; `out` collects every emitted record.
#[allow(clippy::too_many_arguments)]
fn explore_value(
    ctx: &Ctx<'_>,
    budget: &mut Budget,
    explored: &mut HashSet<B256>,
    base: U256,
    offset: u8,
    type_id: &str,
    path: &[PathSegment],
    out: &mut Vec<AccessRecord>,
) {
    let Some(type_def) = ctx.layout.type_of(type_id) else { return };
    match type_def {
        TypeDef::Primitive { name, byte_width } => {
            let kind = classify_primitive(name);
            let slot = u256_to_b256(base);
            if let Some((current, next, modified)) =
                slot_value(ctx, slot, |raw| Some(decode_primitive(raw, offset, *byte_width, kind)))
            {
                explored.insert(slot);
                out.push(AccessRecord {
                    slots: vec![slot],
                    path: path.to_vec(),
                    full_expression: compose_expression_root(path),
                    current,
                    next,
                    modified,
                    note: None,
                });
            }
        }
        TypeDef::Bytes { kind } => explore_bytes(ctx, explored, base, *kind, path, out),
        TypeDef::StaticArray { base_type_id, length, stride } => {
            for i in 0..*length {
                let (slot, elem_offset) = element_location(base, i, *stride);
                let mut child_path = path.to_vec();
                child_path.push(PathSegment::ArrayIndex { index: i });
                explore_value(ctx, budget, explored, slot, elem_offset, base_type_id, &child_path, out);
            }
        }
        TypeDef::DynamicArray { base_type_id } => {
            explore_dynamic_array(ctx, budget, explored, base, base_type_id, path, out)
        }
        TypeDef::Mapping { key_type_id, value_type_id } => {
            explore_mapping(ctx, budget, explored, base, key_type_id, value_type_id, path, out)
        }
        TypeDef::Struct { fields, .. } => {
            for field in fields {
                let field_base = struct_field_slot(base, field.slot_in_struct);
                let mut child_path = path.to_vec();
                child_path.push(PathSegment::StructField { name: field.label.clone() });
                explore_value(ctx, budget, explored, field_base, field.offset, &field.type_id, &child_path, out);
            }
        }
    }
}

fn compose_expression_root(path: &[PathSegment]) -> String {
    // Callers pass the *full* path including no variable name; the name is
    // prefixed by the top-level caller once the trace is attached to its
    // `LabeledVariable`. Kept as a free function so tests can exercise
    // path composition without a layout in scope.
    compose_expression("", path)
}

fn explore_bytes(
    ctx: &Ctx<'_>,
    explored: &mut HashSet<B256>,
    base: U256,
    kind: BytesKind,
    path: &[PathSegment],
    out: &mut Vec<AccessRecord>,
) {
    let header_slot = u256_to_b256(base);
    let Some(observed) = ctx.observed.get(&header_slot) else { return };
    explored.insert(header_slot);

    let is_long = |raw: &B256| raw.as_slice()[31] % 2 != 0;
    let long = is_long(&observed.current) || observed.next.is_some_and(|n| is_long(&n));

    if !long {
        let decode = |raw: &B256| decode_short_bytes(raw).map(|s| make_bytes_value(&s.content, kind));
        let current = SlotValue::new(observed.current, decode(&observed.current));
        let next = observed.next.map(|n| SlotValue::new(n, decode(&n)));
        let modified = observed.next.is_some_and(|n| n != observed.current);
        out.push(AccessRecord {
            slots: vec![header_slot],
            path: path.to_vec(),
            full_expression: compose_expression_root(path),
            current,
            next,
            modified,
            note: None,
        });
        return;
    }

    // Long encoding: one record for the length, one for the reassembled
    // content across whatever continuation slots were actually observed.
    let length_current = decode_long_length(&observed.current);
    let length_next = observed.next.and_then(|n| decode_long_length(&n));
    let mut length_path = path.to_vec();
    length_path.push(PathSegment::BytesLength);
    out.push(AccessRecord {
        slots: vec![header_slot],
        path: length_path.clone(),
        full_expression: compose_expression_root(&length_path),
        current: SlotValue::new(observed.current, length_current.map(|l| DecodedValue::Uint(U256::from(l)))),
        next: observed
            .next
            .map(|n| SlotValue::new(n, length_next.map(|l| DecodedValue::Uint(U256::from(l))))),
        modified: observed.next.is_some_and(|n| n != observed.current),
        note: None,
    });

    let declared_len = length_next.or(length_current).unwrap_or(0);
    let slot_count = declared_len.div_ceil(32).max(1);
    let data_base = long_bytes_data_base(base);

    let mut continuation_slots = Vec::new();
    let mut current_bytes = Vec::new();
    let mut next_bytes = Vec::new();
    let mut first_chunk_current = None;
    let mut first_chunk_next = None;
    let mut any_next = false;
    let mut any_missing = false;
    for k in 0..slot_count {
        let slot = u256_to_b256(data_base.wrapping_add(U256::from(k)));
        let Some(chunk) = ctx.observed.get(&slot) else {
            any_missing = true;
            continue;
        };
        explored.insert(slot);
        continuation_slots.push(slot);
        if first_chunk_current.is_none() {
            first_chunk_current = Some(chunk.current);
            first_chunk_next = chunk.next;
        }
        current_bytes.extend_from_slice(chunk.current.as_slice());
        if let Some(n) = chunk.next {
            any_next = true;
            next_bytes.extend_from_slice(n.as_slice());
        } else {
            next_bytes.extend_from_slice(chunk.current.as_slice());
        }
    }

    if continuation_slots.is_empty() {
        return;
    }

    let note = any_missing.then(|| "Some continuation slots were not observed; decoded value may be truncated.".to_string());
    let current_decoded = (!any_missing).then(|| make_bytes_value(&truncate(&current_bytes, declared_len), kind));
    let next_decoded =
        (any_next && !any_missing).then(|| make_bytes_value(&truncate(&next_bytes, declared_len), kind));

    let slots: Vec<B256> = std::iter::once(header_slot).chain(continuation_slots).collect();
    // `hex` pairs with the first continuation slot's own raw bytes — the
    // actual content data, not the header's length marker — so it stays
    // consistent with `decoded`, which is reassembled from that same data.
    let first_current_raw = first_chunk_current.expect("continuation_slots non-empty implies a first chunk");

    out.push(AccessRecord {
        slots,
        path: path.to_vec(),
        full_expression: compose_expression_root(path),
        current: SlotValue::new(first_current_raw, current_decoded),
        next: any_next.then(|| SlotValue::new(first_chunk_next.unwrap_or(first_current_raw), next_decoded.clone())),
        modified: any_next,
        note,
    });
}

fn truncate(bytes: &[u8], len: u64) -> Vec<u8> {
    let len = (len as usize).min(bytes.len());
    bytes[..len].to_vec()
}

fn make_bytes_value(bytes: &[u8], kind: BytesKind) -> DecodedValue {
    match kind {
        BytesKind::Bytes => DecodedValue::Bytes(bytes.to_vec()),
        BytesKind::String => match std::str::from_utf8(bytes) {
            Ok(s) => DecodedValue::String(s.to_string()),
            Err(_) => DecodedValue::Bytes(bytes.to_vec()),
        },
    }
}

fn explore_dynamic_array(
    ctx: &Ctx<'_>,
    budget: &mut Budget,
    explored: &mut HashSet<B256>,
    base: U256,
    base_type_id: &str,
    path: &[PathSegment],
    out: &mut Vec<AccessRecord>,
) {
    let length_slot = u256_to_b256(base);
    let length_observed = ctx.observed.get(&length_slot);
    let mut current_len = 0u64;
    let mut next_len: Option<u64> = None;

    if let Some(observed) = length_observed {
        explored.insert(length_slot);
        current_len = U256::from_be_bytes(observed.current.0).to::<u64>();
        next_len = observed.next.map(|n| U256::from_be_bytes(n.0).to::<u64>());
        let mut length_path = path.to_vec();
        length_path.push(PathSegment::ArrayLength);
        let modified = observed.next.is_some_and(|n| n != observed.current);
        out.push(AccessRecord {
            slots: vec![length_slot],
            path: length_path.clone(),
            full_expression: compose_expression_root(&length_path),
            current: SlotValue::new(observed.current, Some(DecodedValue::Uint(U256::from(current_len)))),
            next: observed.next.map(|n| SlotValue::new(n, next_len.map(|l| DecodedValue::Uint(U256::from(l))))),
            modified,
            note: None,
        });
    }

    // With a known length, only sweep indices inside it (capped, for safety,
    // at the configured bound). With no length observation at all (the
    // length slot itself wasn't touched), fall back to sweeping up to the
    // configured bound blindly.
    let declared_len = current_len.max(next_len.unwrap_or(0));
    let sweep_len = if length_observed.is_some() {
        declared_len.min(ctx.config.max_dyn_array_sweep)
    } else {
        ctx.config.max_dyn_array_sweep
    };

    let stride = byte_width_of(ctx.layout, base_type_id).max(1);
    let data_base = dyn_array_data_base(base);

    let mut indices: Vec<u64> = (0..sweep_len).collect();
    for candidate in ctx.pool.numeric_candidates(u64::from(u32::MAX)) {
        if !indices.contains(&candidate) {
            indices.push(candidate);
        }
    }
    indices.sort_unstable();
    indices.dedup();

    for i in indices {
        if budget.exhausted() {
            break;
        }
        budget.spend(1);
        let (slot, elem_offset) = element_location(data_base, i, stride);
        let mut child_path = path.to_vec();
        child_path.push(PathSegment::ArrayIndex { index: i });
        explore_value(ctx, budget, explored, slot, elem_offset, base_type_id, &child_path, out);
    }
}

/// Peels nested `mapping(K => mapping(...))` layers up to
/// `max_mapping_depth`, returning the key type chain and the terminal
/// (non-mapping, or depth-capped) value type id.
fn peel_mapping_chain<'a>(layout: &'a StorageLayout, mut value_type_id: &'a str, max_depth: u32) -> (Vec<&'a str>, &'a str) {
    let mut keys = Vec::new();
    loop {
        if keys.len() as u32 >= max_depth {
            break;
        }
        match layout.type_of(value_type_id) {
            Some(TypeDef::Mapping { key_type_id, value_type_id: next }) => {
                keys.push(key_type_id.as_str());
                value_type_id = next.as_str();
            }
            _ => break,
        }
    }
    (keys, value_type_id)
}

fn explore_mapping(
    ctx: &Ctx<'_>,
    budget: &mut Budget,
    explored: &mut HashSet<B256>,
    base: U256,
    first_key_type_id: &str,
    first_value_type_id: &str,
    path: &[PathSegment],
    out: &mut Vec<AccessRecord>,
) {
    let mut key_type_ids = vec![first_key_type_id];
    let (rest, terminal_value_type_id) =
        peel_mapping_chain(ctx.layout, first_value_type_id, ctx.config.max_mapping_depth.saturating_sub(1));
    key_type_ids.extend(rest);
    let depth = key_type_ids.len();

    let declared_types: Vec<PreimageType> =
        key_type_ids.iter().map(|id| declared_preimage_type(ctx.layout, id)).collect();

    let all_addresses = declared_types.iter().all(|t| *t == PreimageType::Address) && !ctx.pool.addresses().is_empty();

    if all_addresses {
        explore_mapping_address_fast_path(
            ctx,
            budget,
            explored,
            base,
            depth,
            terminal_value_type_id,
            path,
            out,
        );
        return;
    }

    explore_mapping_bfs(ctx, budget, explored, base, &key_type_ids, &declared_types, terminal_value_type_id, path, out);
}

fn explore_mapping_address_fast_path(
    ctx: &Ctx<'_>,
    budget: &mut Budget,
    explored: &mut HashSet<B256>,
    base: U256,
    depth: usize,
    terminal_value_type_id: &str,
    path: &[PathSegment],
    out: &mut Vec<AccessRecord>,
) {
    let addresses = ctx.pool.addresses();
    for combo in itertools::repeat_n(addresses.iter().copied(), depth).multi_cartesian_product() {
        if budget.exhausted() {
            break;
        }
        let mut slot = base;
        let mut child_path = path.to_vec();
        for preimage in combo {
            budget.spend(1);
            slot = mapping_slot(slot, preimage.hex);
            child_path.push(mapping_key_segment(preimage));
        }
        let final_slot = u256_to_b256(slot);
        if ctx.observed.contains(&final_slot) {
            explore_value(ctx, budget, explored, slot, 0, terminal_value_type_id, &child_path, out);
        }
    }
}

fn mapping_key_segment(preimage: &Preimage) -> PathSegment {
    PathSegment::MappingKey {
        key_hex: preimage.hex.to_string(),
        key_decoded: preimage.decoded.clone(),
        key_type: preimage.ty,
    }
}

struct BfsState {
    slot: U256,
    level: usize,
    path: Vec<PathSegment>,
    used: Vec<B256>,
}

/// Breadth-first search over nested mapping key chains. Intermediate
/// (virtual, derived) slots are never checked against `observed` — only the
/// terminal slot at full depth is, since only it is a real storage location.
fn explore_mapping_bfs(
    ctx: &Ctx<'_>,
    budget: &mut Budget,
    explored: &mut HashSet<B256>,
    base: U256,
    key_type_ids: &[&str],
    declared_types: &[PreimageType],
    terminal_value_type_id: &str,
    path: &[PathSegment],
    out: &mut Vec<AccessRecord>,
) {
    let depth = key_type_ids.len();
    let mut queue: VecDeque<BfsState> = VecDeque::new();
    queue.push_back(BfsState { slot: base, level: 0, path: path.to_vec(), used: Vec::new() });

    while let Some(state) = queue.pop_front() {
        if budget.exhausted() {
            break;
        }
        let candidates = ctx.pool.candidates_for(declared_types[state.level]);
        for preimage in candidates {
            if state.used.contains(&preimage.hex) {
                continue;
            }
            if budget.exhausted() {
                break;
            }
            budget.spend(1);
            let next_slot = mapping_slot(state.slot, preimage.hex);
            let mut next_path = state.path.clone();
            next_path.push(mapping_key_segment(preimage));
            let mut next_used = state.used.clone();
            next_used.push(preimage.hex);

            if state.level + 1 == depth {
                let final_slot = u256_to_b256(next_slot);
                if ctx.observed.contains(&final_slot) {
                    explore_value(ctx, budget, explored, next_slot, 0, terminal_value_type_id, &next_path, out);
                }
            } else {
                queue.push_back(BfsState { slot: next_slot, level: state.level + 1, path: next_path, used: next_used });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutVariable;
    use alloy_primitives::Address;
    use std::collections::BTreeMap as Map;

    fn primitive(name: &str, width: u8) -> TypeDef {
        TypeDef::Primitive { name: name.to_string(), byte_width: width }
    }

    #[test]
    fn s1_simple_mapping_write() {
        let mut types = Map::new();
        types.insert("t_address".to_string(), primitive("address", 20));
        types.insert("t_uint256".to_string(), primitive("uint256", 32));
        types.insert(
            "t_mapping".to_string(),
            TypeDef::Mapping { key_type_id: "t_address".to_string(), value_type_id: "t_uint256".to_string() },
        );
        let layout = StorageLayout {
            storage: vec![LayoutVariable {
                label: "balances".to_string(),
                slot: U256::ZERO,
                offset: 0,
                type_id: "t_mapping".to_string(),
            }],
            types,
        };

        let addr = Address::repeat_byte(0xCA);
        let key = crate::slot::pad32(addr.as_slice());
        let slot = u256_to_b256(mapping_slot(U256::ZERO, key));

        let mut observed = ObservedSlots::new();
        observed.insert(slot, ObservedSlot { current: B256::ZERO, next: Some(u256_to_b256(U256::from(1000u64))) });

        let pool = PreimagePool::builder().push_address(addr).build();
        let output = explore(&layout, &observed, &pool, &ExploreConfig::default());

        assert_eq!(output.unexplored.len(), 0);
        assert_eq!(output.variables.len(), 1);
        let var = &output.variables[0];
        assert_eq!(var.name, "balances");
        assert_eq!(var.trace.len(), 1);
        let record = &var.trace[0];
        assert_eq!(record.current.decoded, Some(DecodedValue::Uint(U256::ZERO)));
        assert_eq!(record.next.as_ref().unwrap().decoded, Some(DecodedValue::Uint(U256::from(1000u64))));
        similar_asserts::assert_eq!(
            record.full_expression,
            format!("balances[0x{}]", alloy_primitives::hex::encode(addr.as_slice()))
        );
    }

    #[test]
    fn s2_packed_slot_partial_write() {
        let mut types = Map::new();
        types.insert("t_uint8".to_string(), primitive("uint8", 1));
        types.insert("t_bool".to_string(), primitive("bool", 1));
        types.insert("t_address".to_string(), primitive("address", 20));
        let layout = StorageLayout {
            storage: vec![
                LayoutVariable { label: "smallValue1".to_string(), slot: U256::ZERO, offset: 0, type_id: "t_uint8".to_string() },
                LayoutVariable { label: "smallValue2".to_string(), slot: U256::ZERO, offset: 1, type_id: "t_uint8".to_string() },
                LayoutVariable { label: "flag".to_string(), slot: U256::ZERO, offset: 2, type_id: "t_bool".to_string() },
                LayoutVariable { label: "someAddress".to_string(), slot: U256::ZERO, offset: 3, type_id: "t_address".to_string() },
            ],
            types,
        };

        let addr = Address::repeat_byte(0xCA);
        let mut next = [0u8; 32];
        next[9..29].copy_from_slice(addr.as_slice());
        next[29] = 1; // flag
        next[30] = 2; // smallValue2
        next[31] = 1; // smallValue1

        let mut observed = ObservedSlots::new();
        observed.insert(B256::ZERO, ObservedSlot { current: B256::ZERO, next: Some(B256::from(next)) });

        let pool = PreimagePool::default();
        let output = explore(&layout, &observed, &pool, &ExploreConfig::default());
        assert_eq!(output.variables.len(), 4);
        assert_eq!(output.unexplored.len(), 0);

        let find = |name: &str| output.variables.iter().find(|v| v.name == name).unwrap();
        assert_eq!(find("smallValue1").trace[0].next.as_ref().unwrap().decoded, Some(DecodedValue::Uint(U256::from(1u64))));
        assert_eq!(find("smallValue2").trace[0].next.as_ref().unwrap().decoded, Some(DecodedValue::Uint(U256::from(2u64))));
        assert_eq!(find("flag").trace[0].next.as_ref().unwrap().decoded, Some(DecodedValue::Bool(true)));
        assert_eq!(find("someAddress").trace[0].next.as_ref().unwrap().decoded, Some(DecodedValue::Address(addr)));
    }

    #[test]
    fn s3_dynamic_array_push() {
        let mut types = Map::new();
        types.insert("t_uint256".to_string(), primitive("uint256", 32));
        types.insert("t_array".to_string(), TypeDef::DynamicArray { base_type_id: "t_uint256".to_string() });
        let layout = StorageLayout {
            storage: vec![LayoutVariable {
                label: "values".to_string(),
                slot: U256::from(7u64),
                offset: 0,
                type_id: "t_array".to_string(),
            }],
            types,
        };

        let length_slot = u256_to_b256(U256::from(7u64));
        let data_base = dyn_array_data_base(U256::from(7u64));
        let elem0 = u256_to_b256(data_base);

        let mut observed = ObservedSlots::new();
        observed.insert(length_slot, ObservedSlot { current: B256::ZERO, next: Some(u256_to_b256(U256::from(1u64))) });
        observed.insert(elem0, ObservedSlot { current: B256::ZERO, next: Some(u256_to_b256(U256::from(123u64))) });

        let pool = PreimagePool::default();
        let output = explore(&layout, &observed, &pool, &ExploreConfig::default());
        assert_eq!(output.unexplored.len(), 0);
        let var = output.variables.iter().find(|v| v.name == "values").unwrap();
        assert_eq!(var.trace.len(), 2);
        assert!(var.trace.iter().any(|r| matches!(r.path.as_slice(), [PathSegment::ArrayLength])));
        assert!(var.trace.iter().any(|r| matches!(r.path.as_slice(), [PathSegment::ArrayIndex { index: 0 }])));
    }

    #[test]
    fn s4_nested_mapping() {
        let mut types = Map::new();
        types.insert("t_address".to_string(), primitive("address", 20));
        types.insert("t_uint256".to_string(), primitive("uint256", 32));
        types.insert(
            "t_inner".to_string(),
            TypeDef::Mapping { key_type_id: "t_address".to_string(), value_type_id: "t_uint256".to_string() },
        );
        types.insert(
            "t_outer".to_string(),
            TypeDef::Mapping { key_type_id: "t_address".to_string(), value_type_id: "t_inner".to_string() },
        );
        let layout = StorageLayout {
            storage: vec![LayoutVariable {
                label: "allowances".to_string(),
                slot: U256::from(1u64),
                offset: 0,
                type_id: "t_outer".to_string(),
            }],
            types,
        };

        let owner = Address::repeat_byte(0xAA);
        let spender = Address::repeat_byte(0xBB);
        let owner_slot = mapping_slot(U256::from(1u64), crate::slot::pad32(owner.as_slice()));
        let final_slot = mapping_slot(owner_slot, crate::slot::pad32(spender.as_slice()));

        let mut observed = ObservedSlots::new();
        observed.insert(u256_to_b256(final_slot), ObservedSlot { current: B256::ZERO, next: Some(u256_to_b256(U256::from(1000u64))) });

        let pool = PreimagePool::builder().push_address(owner).push_address(spender).build();
        let output = explore(&layout, &observed, &pool, &ExploreConfig::default());
        assert_eq!(output.unexplored.len(), 0);
        let var = output.variables.iter().find(|v| v.name == "allowances").unwrap();
        assert_eq!(var.trace.len(), 1);
        assert_eq!(var.trace[0].path.len(), 2);
    }

    #[test]
    fn unknown_slots_become_synthetic_records() {
        let layout = StorageLayout::default();
        let mut observed = ObservedSlots::new();
        let slot = B256::repeat_byte(0x11);
        observed.insert(slot, ObservedSlot { current: B256::ZERO, next: Some(B256::repeat_byte(0x22)) });
        let pool = PreimagePool::default();
        let output = explore(&layout, &observed, &pool, &ExploreConfig::default());
        assert_eq!(output.variables.len(), 0);
        assert_eq!(output.unexplored.len(), 1);
        assert_eq!(output.unexplored[0].trace[0].note.as_deref(), Some("Could not label this slot access because no layout was found."));
    }
}
