//! Parameter expressions for parameterized circuits.
//!
//! [`ParameterExpression`] is generic over its symbol type so every native
//! model can keep its own notion of a free parameter (a sympy symbol, a
//! Braket `FreeParameter`, a uuid-tagged Qiskit `Parameter`, a Quil memory
//! reference) while sharing the same arithmetic. The canonical model uses
//! [`ParamId`] as the symbol type, see [`Angle`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::f64::consts::PI;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A native free parameter that has a user-facing name.
pub trait NamedSymbol {
    /// Name used for binding and for allocating a [`ParamId`].
    fn symbol_name(&self) -> String;
}

impl NamedSymbol for String {
    fn symbol_name(&self) -> String {
        self.clone()
    }
}

/// An abstract, not-yet-bound parameter.
///
/// Equality, ordering and hashing only look at `index`; the name is carried
/// for diagnostics and for re-emitting a native symbol on export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamId {
    /// First-seen index within one conversion.
    pub index: u32,
    /// Name of the native symbol this parameter came from.
    pub name: String,
}

impl ParamId {
    /// Create a new parameter id.
    pub fn new(index: u32, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

impl PartialEq for ParamId {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for ParamId {}

impl Hash for ParamId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl PartialOrd for ParamId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ParamId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl NamedSymbol for ParamId {
    fn symbol_name(&self) -> String {
        self.name.clone()
    }
}

/// A symbolic or concrete parameter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterExpression<S = String> {
    /// A constant numeric value.
    Constant(f64),
    /// A symbolic parameter.
    Symbol(S),
    /// The constant π.
    Pi,
    /// Negation.
    Neg(Box<ParameterExpression<S>>),
    /// Addition.
    Add(Box<ParameterExpression<S>>, Box<ParameterExpression<S>>),
    /// Subtraction.
    Sub(Box<ParameterExpression<S>>, Box<ParameterExpression<S>>),
    /// Multiplication.
    Mul(Box<ParameterExpression<S>>, Box<ParameterExpression<S>>),
    /// Division.
    Div(Box<ParameterExpression<S>>, Box<ParameterExpression<S>>),
}

/// Canonical gate argument: a bound literal or an expression over [`ParamId`]s.
pub type Angle = ParameterExpression<ParamId>;

impl<S> ParameterExpression<S> {
    /// Create a constant parameter.
    pub fn constant(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }

    /// Create a symbolic parameter.
    pub fn symbol(symbol: impl Into<S>) -> Self {
        ParameterExpression::Symbol(symbol.into())
    }

    /// Create a π constant.
    pub fn pi() -> Self {
        ParameterExpression::Pi
    }

    /// Check if this expression contains any symbols.
    pub fn is_symbolic(&self) -> bool {
        match self {
            ParameterExpression::Symbol(_) => true,
            ParameterExpression::Constant(_) | ParameterExpression::Pi => false,
            ParameterExpression::Neg(e) => e.is_symbolic(),
            ParameterExpression::Add(a, b)
            | ParameterExpression::Sub(a, b)
            | ParameterExpression::Mul(a, b)
            | ParameterExpression::Div(a, b) => a.is_symbolic() || b.is_symbolic(),
        }
    }

    /// Try to evaluate as a concrete f64 value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterExpression::Constant(v) => Some(*v),
            ParameterExpression::Symbol(_) => None,
            ParameterExpression::Pi => Some(PI),
            ParameterExpression::Neg(e) => e.as_f64().map(|v| -v),
            ParameterExpression::Add(a, b) => Some(a.as_f64()? + b.as_f64()?),
            ParameterExpression::Sub(a, b) => Some(a.as_f64()? - b.as_f64()?),
            ParameterExpression::Mul(a, b) => Some(a.as_f64()? * b.as_f64()?),
            ParameterExpression::Div(a, b) => {
                let divisor = b.as_f64()?;
                if divisor == 0.0 {
                    return None;
                }
                Some(a.as_f64()? / divisor)
            }
        }
    }

    /// Get all symbols in this expression, in first-seen order.
    pub fn symbols(&self) -> Vec<&S>
    where
        S: PartialEq,
    {
        let mut out = Vec::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols<'a>(&'a self, out: &mut Vec<&'a S>)
    where
        S: PartialEq,
    {
        match self {
            ParameterExpression::Constant(_) | ParameterExpression::Pi => {}
            ParameterExpression::Symbol(s) => {
                if !out.contains(&s) {
                    out.push(s);
                }
            }
            ParameterExpression::Neg(e) => e.collect_symbols(out),
            ParameterExpression::Add(a, b)
            | ParameterExpression::Sub(a, b)
            | ParameterExpression::Mul(a, b)
            | ParameterExpression::Div(a, b) => {
                a.collect_symbols(out);
                b.collect_symbols(out);
            }
        }
    }

    /// Rebuild the expression over a different symbol type.
    pub fn map_symbols<T>(&self, f: &mut impl FnMut(&S) -> T) -> ParameterExpression<T> {
        match self {
            ParameterExpression::Constant(v) => ParameterExpression::Constant(*v),
            ParameterExpression::Pi => ParameterExpression::Pi,
            ParameterExpression::Symbol(s) => ParameterExpression::Symbol(f(s)),
            ParameterExpression::Neg(e) => ParameterExpression::Neg(Box::new(e.map_symbols(f))),
            ParameterExpression::Add(a, b) => {
                ParameterExpression::Add(Box::new(a.map_symbols(f)), Box::new(b.map_symbols(f)))
            }
            ParameterExpression::Sub(a, b) => {
                ParameterExpression::Sub(Box::new(a.map_symbols(f)), Box::new(b.map_symbols(f)))
            }
            ParameterExpression::Mul(a, b) => {
                ParameterExpression::Mul(Box::new(a.map_symbols(f)), Box::new(b.map_symbols(f)))
            }
            ParameterExpression::Div(a, b) => {
                ParameterExpression::Div(Box::new(a.map_symbols(f)), Box::new(b.map_symbols(f)))
            }
        }
    }

    /// Fallible variant of [`map_symbols`](Self::map_symbols).
    pub fn try_map_symbols<T, E>(
        &self,
        f: &mut impl FnMut(&S) -> Result<T, E>,
    ) -> Result<ParameterExpression<T>, E> {
        Ok(match self {
            ParameterExpression::Constant(v) => ParameterExpression::Constant(*v),
            ParameterExpression::Pi => ParameterExpression::Pi,
            ParameterExpression::Symbol(s) => ParameterExpression::Symbol(f(s)?),
            ParameterExpression::Neg(e) => ParameterExpression::Neg(Box::new(e.try_map_symbols(f)?)),
            ParameterExpression::Add(a, b) => ParameterExpression::Add(
                Box::new(a.try_map_symbols(f)?),
                Box::new(b.try_map_symbols(f)?),
            ),
            ParameterExpression::Sub(a, b) => ParameterExpression::Sub(
                Box::new(a.try_map_symbols(f)?),
                Box::new(b.try_map_symbols(f)?),
            ),
            ParameterExpression::Mul(a, b) => ParameterExpression::Mul(
                Box::new(a.try_map_symbols(f)?),
                Box::new(b.try_map_symbols(f)?),
            ),
            ParameterExpression::Div(a, b) => ParameterExpression::Div(
                Box::new(a.try_map_symbols(f)?),
                Box::new(b.try_map_symbols(f)?),
            ),
        })
    }
}

impl<S: Clone> ParameterExpression<S> {
    /// Substitute every symbol for which `lookup` yields a value.
    pub fn bind_with(&self, lookup: &impl Fn(&S) -> Option<f64>) -> Self {
        match self {
            ParameterExpression::Symbol(s) => match lookup(s) {
                Some(v) => ParameterExpression::Constant(v),
                None => self.clone(),
            },
            ParameterExpression::Constant(_) | ParameterExpression::Pi => self.clone(),
            ParameterExpression::Neg(e) => ParameterExpression::Neg(Box::new(e.bind_with(lookup))),
            ParameterExpression::Add(a, b) => ParameterExpression::Add(
                Box::new(a.bind_with(lookup)),
                Box::new(b.bind_with(lookup)),
            ),
            ParameterExpression::Sub(a, b) => ParameterExpression::Sub(
                Box::new(a.bind_with(lookup)),
                Box::new(b.bind_with(lookup)),
            ),
            ParameterExpression::Mul(a, b) => ParameterExpression::Mul(
                Box::new(a.bind_with(lookup)),
                Box::new(b.bind_with(lookup)),
            ),
            ParameterExpression::Div(a, b) => ParameterExpression::Div(
                Box::new(a.bind_with(lookup)),
                Box::new(b.bind_with(lookup)),
            ),
        }
    }

    /// Bind a single symbol to a value, returning a new expression.
    pub fn bind(&self, symbol: &S, value: f64) -> Self
    where
        S: PartialEq,
    {
        self.bind_with(&|s| (s == symbol).then_some(value))
    }

    /// Simplify the expression by evaluating constant subexpressions.
    pub fn simplify(&self) -> Self {
        if let Some(v) = self.as_f64() {
            return ParameterExpression::Constant(v);
        }
        match self {
            ParameterExpression::Neg(e) => {
                let e = e.simplify();
                match e {
                    ParameterExpression::Neg(inner) => *inner,
                    other => ParameterExpression::Neg(Box::new(other)),
                }
            }
            ParameterExpression::Add(a, b) => {
                let a = a.simplify();
                let b = b.simplify();
                match (a.as_f64(), b.as_f64()) {
                    (Some(av), Some(bv)) => ParameterExpression::Constant(av + bv),
                    (Some(av), None) if av == 0.0 => b,
                    (None, Some(bv)) if bv == 0.0 => a,
                    _ => ParameterExpression::Add(Box::new(a), Box::new(b)),
                }
            }
            ParameterExpression::Sub(a, b) => {
                let a = a.simplify();
                let b = b.simplify();
                match (a.as_f64(), b.as_f64()) {
                    (Some(av), Some(bv)) => ParameterExpression::Constant(av - bv),
                    (None, Some(bv)) if bv == 0.0 => a,
                    _ => ParameterExpression::Sub(Box::new(a), Box::new(b)),
                }
            }
            ParameterExpression::Mul(a, b) => {
                let a = a.simplify();
                let b = b.simplify();
                match (a.as_f64(), b.as_f64()) {
                    (Some(av), Some(bv)) => ParameterExpression::Constant(av * bv),
                    (Some(av), None) if av == 1.0 => b,
                    (None, Some(bv)) if bv == 1.0 => a,
                    _ => ParameterExpression::Mul(Box::new(a), Box::new(b)),
                }
            }
            ParameterExpression::Div(a, b) => {
                let a = a.simplify();
                let b = b.simplify();
                match (a.as_f64(), b.as_f64()) {
                    (Some(av), Some(bv)) if bv != 0.0 => ParameterExpression::Constant(av / bv),
                    (None, Some(bv)) if bv == 1.0 => a,
                    _ => ParameterExpression::Div(Box::new(a), Box::new(b)),
                }
            }
            _ => self.clone(),
        }
    }

    /// Multiply by a constant factor and simplify.
    pub fn scale(&self, factor: f64) -> Self {
        (ParameterExpression::Constant(factor) * self.clone()).simplify()
    }

    /// Convert an angle in radians to half-turns (`θ/π`).
    ///
    /// `(x·π)/π` collapses back to `x`, so symbolic values survive a
    /// radians → half-turns → radians round trip unchanged.
    pub fn to_half_turns(&self) -> Self {
        if let Some(v) = self.as_f64() {
            return ParameterExpression::Constant(v / PI);
        }
        match self {
            ParameterExpression::Mul(a, b) if a.is_pi() => b.simplify(),
            ParameterExpression::Mul(a, b) if b.is_pi() => a.simplify(),
            _ => ParameterExpression::Div(Box::new(self.simplify()), Box::new(ParameterExpression::Pi)),
        }
    }

    /// Convert half-turns back to radians (`t·π`).
    pub fn from_half_turns(&self) -> Self {
        if let Some(v) = self.as_f64() {
            return ParameterExpression::Constant(v * PI);
        }
        match self {
            ParameterExpression::Div(a, b) if b.is_pi() => a.simplify(),
            _ => ParameterExpression::Mul(Box::new(ParameterExpression::Pi), Box::new(self.simplify())),
        }
    }

    fn is_pi(&self) -> bool {
        match self {
            ParameterExpression::Pi => true,
            ParameterExpression::Constant(v) => *v == PI,
            _ => false,
        }
    }
}

impl<S: NamedSymbol> ParameterExpression<S> {
    /// Bind symbols by name.
    pub fn bind_named(&self, lookup: &impl Fn(&str) -> Option<f64>) -> Self
    where
        S: Clone,
    {
        self.bind_with(&|s: &S| lookup(&s.symbol_name()))
    }
}

impl<S: fmt::Display> fmt::Display for ParameterExpression<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterExpression::Constant(v) => write!(f, "{v}"),
            ParameterExpression::Symbol(s) => write!(f, "{s}"),
            ParameterExpression::Pi => write!(f, "π"),
            ParameterExpression::Neg(e) => write!(f, "-({e})"),
            ParameterExpression::Add(a, b) => write!(f, "({a} + {b})"),
            ParameterExpression::Sub(a, b) => write!(f, "({a} - {b})"),
            ParameterExpression::Mul(a, b) => write!(f, "({a} * {b})"),
            ParameterExpression::Div(a, b) => write!(f, "({a} / {b})"),
        }
    }
}

impl<S> From<f64> for ParameterExpression<S> {
    fn from(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }
}

impl<S> From<i32> for ParameterExpression<S> {
    fn from(value: i32) -> Self {
        ParameterExpression::Constant(f64::from(value))
    }
}

impl From<ParamId> for Angle {
    fn from(id: ParamId) -> Self {
        ParameterExpression::Symbol(id)
    }
}

impl<S> std::ops::Add for ParameterExpression<S> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        ParameterExpression::Add(Box::new(self), Box::new(rhs))
    }
}

impl<S> std::ops::Sub for ParameterExpression<S> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        ParameterExpression::Sub(Box::new(self), Box::new(rhs))
    }
}

impl<S> std::ops::Mul for ParameterExpression<S> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        ParameterExpression::Mul(Box::new(self), Box::new(rhs))
    }
}

impl<S> std::ops::Div for ParameterExpression<S> {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        ParameterExpression::Div(Box::new(self), Box::new(rhs))
    }
}

impl<S> std::ops::Neg for ParameterExpression<S> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        ParameterExpression::Neg(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Expr = ParameterExpression<String>;

    #[test]
    fn test_constant() {
        let p = Expr::constant(1.5);
        assert!(!p.is_symbolic());
        assert_eq!(p.as_f64(), Some(1.5));
    }

    #[test]
    fn test_symbol() {
        let p = Expr::symbol("theta");
        assert!(p.is_symbolic());
        assert_eq!(p.as_f64(), None);
        assert_eq!(p.symbols(), vec![&"theta".to_string()]);
    }

    #[test]
    fn test_symbols_first_seen_order() {
        let p = Expr::symbol("b") + Expr::symbol("a") * Expr::symbol("b");
        let names: Vec<&str> = p.symbols().into_iter().map(String::as_str).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_bind() {
        let p = Expr::symbol("theta");
        let bound = p.bind(&"theta".to_string(), PI / 2.0);
        assert!(!bound.is_symbolic());
        assert!((bound.as_f64().unwrap() - PI / 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_bind_named_leaves_other_symbols() {
        let p = Expr::symbol("a") + Expr::symbol("b");
        let bound = p.bind_named(&|name| (name == "a").then_some(1.0));
        assert!(bound.is_symbolic());
        assert_eq!(bound.bind(&"b".to_string(), 2.0).as_f64(), Some(3.0));
    }

    #[test]
    fn test_arithmetic() {
        let a = Expr::constant(2.0);
        let b = Expr::constant(3.0);

        let sum = (a.clone() + b.clone()).simplify();
        assert_eq!(sum.as_f64(), Some(5.0));

        let prod = (a * b).simplify();
        assert_eq!(prod.as_f64(), Some(6.0));
    }

    #[test]
    fn test_half_turns_roundtrip_symbolic() {
        let theta = Expr::symbol("theta");
        let t = theta.to_half_turns();
        assert!(matches!(t, ParameterExpression::Div(_, _)));
        assert_eq!(t.from_half_turns(), theta);

        let back = Expr::pi() * Expr::symbol("t");
        assert_eq!(back.to_half_turns(), Expr::symbol("t"));
    }

    #[test]
    fn test_half_turns_constant() {
        let t = Expr::constant(PI / 2.0).to_half_turns();
        assert!((t.as_f64().unwrap() - 0.5).abs() < 1e-15);
        let r = Expr::constant(0.25).from_half_turns();
        assert!((r.as_f64().unwrap() - PI / 4.0).abs() < 1e-15);
    }

    #[test]
    fn test_map_symbols() {
        let p = Expr::symbol("x") * Expr::constant(2.0);
        let mapped: ParameterExpression<ParamId> = p.map_symbols(&mut |s| ParamId::new(0, s.clone()));
        assert_eq!(mapped.symbols()[0].index, 0);
        assert_eq!(mapped.symbols()[0].name, "x");
    }

    #[test]
    fn test_param_id_equality_ignores_name() {
        assert_eq!(ParamId::new(0, "theta"), ParamId::new(0, "phi"));
        assert_ne!(ParamId::new(0, "theta"), ParamId::new(1, "theta"));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn affine() -> impl Strategy<Value = (f64, f64)> {
            (-4.0_f64..4.0, -4.0_f64..4.0)
        }

        proptest! {
            #[test]
            fn test_half_turns_preserve_bound_value((a, b) in affine(), v in -10.0_f64..10.0) {
                let theta = "theta".to_string();
                let e = Expr::constant(a) * Expr::symbol(theta.clone()) + Expr::constant(b);
                let round = e.to_half_turns().from_half_turns();
                let want = e.bind(&theta, v).as_f64().unwrap();
                let got = round.bind(&theta, v).as_f64().unwrap();
                prop_assert!((want - got).abs() < 1e-9, "{} vs {}", want, got);
            }

            #[test]
            fn test_simplify_preserves_value((a, b) in affine(), v in -10.0_f64..10.0) {
                let x = "x".to_string();
                let e = (Expr::constant(a) + Expr::symbol(x.clone())) * Expr::constant(b)
                    - -Expr::symbol(x.clone());
                let want = e.bind(&x, v).as_f64().unwrap();
                let got = e.simplify().bind(&x, v).as_f64().unwrap();
                prop_assert!((want - got).abs() < 1e-9);
            }
        }
    }
}
