//! First-seen interning of native qubits and parameters.
//!
//! Each import builds one [`QubitIndex`] and one [`ParamIndex`]. Both hand
//! out dense indices in the order native objects are first encountered and
//! keep the reverse mapping, so the association is a bijection for the
//! lifetime of that import.

use rustc_hash::FxHashMap;
use std::hash::Hash;

use crate::parameter::{Angle, NamedSymbol, ParamId, ParameterExpression};
use crate::qubit::QubitId;

/// Mapping from native qubit objects to canonical [`QubitId`]s.
#[derive(Debug, Clone)]
pub struct QubitIndex<Q> {
    ids: FxHashMap<Q, QubitId>,
    natives: Vec<Q>,
}

impl<Q: Clone + Eq + Hash> QubitIndex<Q> {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            ids: FxHashMap::default(),
            natives: Vec::new(),
        }
    }

    /// Return the id for `qubit`, allocating the next one on first sight.
    pub fn intern(&mut self, qubit: &Q) -> QubitId {
        if let Some(&id) = self.ids.get(qubit) {
            return id;
        }
        let id = QubitId(self.natives.len() as u32);
        self.ids.insert(qubit.clone(), id);
        self.natives.push(qubit.clone());
        id
    }

    /// Intern every qubit of an operation in operand order.
    pub fn intern_all(&mut self, qubits: &[Q]) -> Vec<QubitId> {
        qubits.iter().map(|q| self.intern(q)).collect()
    }

    /// Look up an already interned qubit.
    pub fn get(&self, qubit: &Q) -> Option<QubitId> {
        self.ids.get(qubit).copied()
    }

    /// The native qubit behind an id.
    pub fn native(&self, id: QubitId) -> Option<&Q> {
        self.natives.get(id.index())
    }

    /// Number of interned qubits.
    pub fn len(&self) -> usize {
        self.natives.len()
    }

    /// Check if no qubit has been interned.
    pub fn is_empty(&self) -> bool {
        self.natives.is_empty()
    }

    /// Iterate `(id, native)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (QubitId, &Q)> {
        self.natives
            .iter()
            .enumerate()
            .map(|(i, q)| (QubitId(i as u32), q))
    }
}

impl<Q: Clone + Eq + Hash> Default for QubitIndex<Q> {
    fn default() -> Self {
        Self::new()
    }
}

/// Mapping from native free parameters to canonical [`ParamId`]s.
#[derive(Debug, Clone)]
pub struct ParamIndex<S> {
    ids: FxHashMap<S, ParamId>,
    natives: Vec<S>,
    params: Vec<ParamId>,
}

impl<S: Clone + Eq + Hash + NamedSymbol> ParamIndex<S> {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            ids: FxHashMap::default(),
            natives: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Return the id for `symbol`, allocating the next one on first sight.
    pub fn intern(&mut self, symbol: &S) -> ParamId {
        if let Some(id) = self.ids.get(symbol) {
            return id.clone();
        }
        let id = ParamId::new(self.params.len() as u32, symbol.symbol_name());
        self.ids.insert(symbol.clone(), id.clone());
        self.natives.push(symbol.clone());
        self.params.push(id.clone());
        id
    }

    /// Rewrite a native expression over canonical ids, interning symbols
    /// in the order they occur.
    pub fn lower(&mut self, expr: &ParameterExpression<S>) -> Angle {
        expr.map_symbols(&mut |s| self.intern(s)).simplify()
    }

    /// Look up an already interned symbol.
    pub fn get(&self, symbol: &S) -> Option<&ParamId> {
        self.ids.get(symbol)
    }

    /// The native symbol behind an id.
    pub fn native(&self, id: &ParamId) -> Option<&S> {
        self.natives.get(id.index as usize)
    }

    /// All allocated ids, in index order.
    pub fn params(&self) -> &[ParamId] {
        &self.params
    }

    /// Number of interned parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if no parameter has been interned.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate `(id, native)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&ParamId, &S)> {
        self.params.iter().zip(self.natives.iter())
    }
}

impl<S: Clone + Eq + Hash + NamedSymbol> Default for ParamIndex<S> {
    fn default() -> Self {
        Self::new()
    }
}
