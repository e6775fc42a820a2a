//! Linear equations over named unknowns and their direct solution.
//!
//! Each [`Equation`] reads `Σ coefficient · variable + constant = 0`. A list of
//! equations is assembled into `A · x = b` with one column per distinct
//! variable (in first-seen order) and solved as `x = A⁻¹ · b`.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use log::trace;
use nalgebra::{DMatrix, DVector};

use crate::errors::EquationError;

/// Pivot size, after scaling every row to unit maximum, at or below which a
/// coefficient matrix is treated as singular.
pub const DEFAULT_SINGULAR_TOLERANCE: f64 = 1.0e-10;

/// One linear equation: `Σ coefficient · variable + constant = 0`.
#[derive(Clone, Debug, PartialEq)]
pub struct Equation<V> {
    /// Terms in insertion order; each variable appears at most once.
    terms: Vec<(V, f64)>,
    /// Constant term on the left hand side.
    constant: f64,
}

impl<V: PartialEq> Equation<V> {
    /// Create an equation with no terms.
    #[must_use]
    pub fn new(constant: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant,
        }
    }

    /// Add `coefficient · variable`, accumulating onto an existing term.
    pub fn add_term(&mut self, variable: V, coefficient: f64) {
        match self.terms.iter_mut().find(|(existing, _)| *existing == variable) {
            Some((_, existing)) => *existing += coefficient,
            None => self.terms.push((variable, coefficient)),
        }
    }

    /// Builder form of [`Equation::add_term`].
    #[must_use]
    pub fn with_term(mut self, variable: V, coefficient: f64) -> Self {
        self.add_term(variable, coefficient);
        self
    }

    /// Terms in insertion order.
    #[must_use]
    pub fn terms(&self) -> &[(V, f64)] {
        &self.terms
    }

    /// The constant term.
    #[must_use]
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Coefficient of `variable`, zero when absent.
    #[must_use]
    pub fn coefficient(&self, variable: &V) -> f64 {
        self.terms
            .iter()
            .find(|(existing, _)| existing == variable)
            .map_or(0.0, |(_, coefficient)| *coefficient)
    }
}

impl<V: fmt::Display> fmt::Display for Equation<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = f.precision().unwrap_or(3);
        for (variable, coefficient) in &self.terms {
            write!(f, "{coefficient:.precision$}·{variable} + ")?;
        }
        write!(f, "{:.precision$} = 0", self.constant)
    }
}

/// Matrix form `A · x = b` of a list of equations.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearSystem<V> {
    /// Unknowns in column order.
    variables: Vec<V>,
    /// Coefficient matrix, one row per equation.
    coefficients: DMatrix<f64>,
    /// Right hand side, the negated constants.
    rhs: DVector<f64>,
}

impl<V> LinearSystem<V> {
    /// Unknowns in column order.
    #[must_use]
    pub fn variables(&self) -> &[V] {
        &self.variables
    }

    /// Coefficient matrix `A`.
    #[must_use]
    pub fn coefficients(&self) -> &DMatrix<f64> {
        &self.coefficients
    }

    /// Right hand side `b`.
    #[must_use]
    pub fn rhs(&self) -> &DVector<f64> {
        &self.rhs
    }

    /// Copy of `A` and `b` with every non-zero row divided by its largest
    /// coefficient magnitude. Solutions are unchanged.
    fn equilibrated(&self) -> (DMatrix<f64>, DVector<f64>) {
        let mut coefficients = self.coefficients.clone();
        let mut rhs = self.rhs.clone();
        for row in 0..coefficients.nrows() {
            let scale = coefficients.row(row).amax();
            if scale > 0.0 {
                coefficients.row_mut(row).unscale_mut(scale);
                rhs[row] /= scale;
            }
        }
        (coefficients, rhs)
    }
}

impl<V: Clone + Eq + Hash> LinearSystem<V> {
    /// Assemble the matrix form of `equations`.
    ///
    /// Columns follow the order in which variables are first seen, scanning
    /// equations in order and terms within each equation in order.
    #[must_use]
    pub fn assemble(equations: &[Equation<V>]) -> Self {
        let mut variables: Vec<V> = Vec::new();
        let mut columns = HashMap::new();
        for equation in equations {
            for (variable, _) in equation.terms() {
                if !columns.contains_key(variable) {
                    columns.insert(variable.clone(), variables.len());
                    variables.push(variable.clone());
                }
            }
        }

        let mut coefficients = DMatrix::zeros(equations.len(), variables.len());
        for (row, equation) in equations.iter().enumerate() {
            for (variable, coefficient) in equation.terms() {
                coefficients[(row, columns[variable])] += *coefficient;
            }
        }
        let rhs = DVector::from_iterator(
            equations.len(),
            equations.iter().map(|equation| -equation.constant()),
        );

        Self {
            variables,
            coefficients,
            rhs,
        }
    }

    /// Solve by inverting `A`.
    ///
    /// Each row is first divided by its largest coefficient magnitude, so the
    /// verdict does not depend on how far the structure sits from the origin.
    /// A pivot of the LU factorization of the scaled matrix no larger than
    /// `tolerance` makes the system singular.
    ///
    /// # Errors
    ///
    /// Returns [`EquationError::NotSquare`] when the equation and unknown counts
    /// differ and [`EquationError::Singular`] when `A` cannot be inverted.
    pub fn solve(&self, tolerance: f64) -> Result<Vec<(V, f64)>, EquationError> {
        let (rows, columns) = self.coefficients.shape();
        if rows != columns {
            return Err(EquationError::NotSquare {
                equations: rows,
                variables: columns,
            });
        }
        if rows == 0 {
            return Ok(Vec::new());
        }

        let (coefficients, rhs) = self.equilibrated();
        let lu = coefficients.lu();
        let smallest_pivot = lu.u().diagonal().amin();
        trace!("{rows}x{columns} system, smallest scaled pivot {smallest_pivot:e}");
        if smallest_pivot <= tolerance {
            return Err(EquationError::Singular);
        }

        let inverse = lu.try_inverse().ok_or(EquationError::Singular)?;
        let solution = &inverse * &rhs;
        if solution.iter().any(|value| !value.is_finite()) {
            return Err(EquationError::Singular);
        }

        Ok(self.variables.iter().cloned().zip(solution.iter().copied()).collect())
    }

    /// Solve a system that may have more equations than unknowns.
    ///
    /// Square systems go straight to [`LinearSystem::solve`]. Taller systems are
    /// reduced to the normal equations `Aᵀ·A · x = Aᵀ·b`, which have a unique
    /// solution exactly when the columns of `A` are independent, and the result
    /// is then checked against every original equation.
    ///
    /// # Errors
    ///
    /// Returns [`EquationError::NotSquare`] when there are fewer equations than
    /// unknowns, [`EquationError::Singular`] when the unknowns are not
    /// independently determined and [`EquationError::Inconsistent`] when some
    /// equation is violated by more than `residual_tolerance · max(1, max|b|)`.
    pub fn solve_overdetermined(
        &self,
        tolerance: f64,
        residual_tolerance: f64,
    ) -> Result<Vec<(V, f64)>, EquationError> {
        let (rows, columns) = self.coefficients.shape();
        if rows <= columns {
            return self.solve(tolerance);
        }

        let (scaled, scaled_rhs) = self.equilibrated();
        let transpose = scaled.transpose();
        let normal = LinearSystem {
            variables: self.variables.clone(),
            coefficients: &transpose * &scaled,
            rhs: &transpose * &scaled_rhs,
        };
        let solution = normal.solve(tolerance)?;

        let values = DVector::from_iterator(columns, solution.iter().map(|(_, value)| *value));
        let residual = (&self.coefficients * values - &self.rhs).amax();
        trace!("{rows}x{columns} overdetermined system, largest residual {residual:e}");
        if residual > residual_tolerance * self.rhs.amax().max(1.0) {
            return Err(EquationError::Inconsistent { residual });
        }
        Ok(solution)
    }
}

/// Solve `equations` for every variable they mention.
///
/// # Errors
///
/// Returns an [`EquationError`] when the system has no unique solution.
///
/// # Examples
/// ```
/// use trussolve::{solve_equations, Equation, DEFAULT_SINGULAR_TOLERANCE};
///
/// // x + y - 3 = 0, x - y - 1 = 0
/// let equations = [
///     Equation::new(-3.0).with_term("x", 1.0).with_term("y", 1.0),
///     Equation::new(-1.0).with_term("x", 1.0).with_term("y", -1.0),
/// ];
/// let solution = solve_equations(&equations, DEFAULT_SINGULAR_TOLERANCE).expect("unique");
/// assert!((solution[0].1 - 2.0).abs() < 1.0e-12);
/// assert!((solution[1].1 - 1.0).abs() < 1.0e-12);
/// ```
pub fn solve_equations<V: Clone + Eq + Hash>(
    equations: &[Equation<V>],
    tolerance: f64,
) -> Result<Vec<(V, f64)>, EquationError> {
    LinearSystem::assemble(equations).solve(tolerance)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn terms_accumulate_per_variable() {
        let equation = Equation::new(1.0)
            .with_term("a", 2.0)
            .with_term("b", 1.0)
            .with_term("a", 0.5);
        assert_eq!(equation.terms(), &[("a", 2.5), ("b", 1.0)]);
        assert_relative_eq!(equation.coefficient(&"c"), 0.0);
    }

    #[test]
    fn columns_follow_first_seen_order() {
        let equations = [
            Equation::new(0.0).with_term("q", 1.0),
            Equation::new(2.0).with_term("p", 3.0).with_term("q", -1.0),
        ];
        let system = LinearSystem::assemble(&equations);
        assert_eq!(system.variables(), &["q", "p"]);
        assert_eq!(
            system.coefficients(),
            &DMatrix::from_row_slice(2, 2, &[1.0, 0.0, -1.0, 3.0])
        );
        assert_eq!(system.rhs(), &DVector::from_vec(vec![0.0, -2.0]));
    }

    #[test]
    fn solves_three_unknowns() {
        // 2x + y - z = 8, -3x - y + 2z = -11, -2x + y + 2z = -3
        let equations = [
            Equation::new(-8.0).with_term("x", 2.0).with_term("y", 1.0).with_term("z", -1.0),
            Equation::new(11.0).with_term("x", -3.0).with_term("y", -1.0).with_term("z", 2.0),
            Equation::new(3.0).with_term("x", -2.0).with_term("y", 1.0).with_term("z", 2.0),
        ];
        let solution = solve_equations(&equations, DEFAULT_SINGULAR_TOLERANCE).expect("unique");
        let values: Vec<f64> = solution.iter().map(|(_, value)| *value).collect();
        assert_relative_eq!(values[0], 2.0, epsilon = 1.0e-9);
        assert_relative_eq!(values[1], 3.0, epsilon = 1.0e-9);
        assert_relative_eq!(values[2], -1.0, epsilon = 1.0e-9);
    }

    #[test]
    fn non_square_systems_have_no_unique_solution() {
        let equations = [
            Equation::new(1.0).with_term("x", 1.0),
            Equation::new(2.0).with_term("x", 2.0),
        ];
        assert_eq!(
            solve_equations(&equations, DEFAULT_SINGULAR_TOLERANCE),
            Err(EquationError::NotSquare {
                equations: 2,
                variables: 1
            })
        );

        let constants_only = [Equation::<&str>::new(1.0)];
        assert_eq!(
            solve_equations(&constants_only, DEFAULT_SINGULAR_TOLERANCE),
            Err(EquationError::NotSquare {
                equations: 1,
                variables: 0
            })
        );
    }

    #[test]
    fn dependent_rows_are_singular() {
        let equations = [
            Equation::new(1.0).with_term("x", 1.0).with_term("y", 2.0),
            Equation::new(2.0).with_term("x", 2.0).with_term("y", 4.0),
        ];
        assert_eq!(
            solve_equations(&equations, DEFAULT_SINGULAR_TOLERANCE),
            Err(EquationError::Singular)
        );
    }

    #[test]
    fn consistent_surplus_equations_are_accepted() {
        // x = 2, y = -1, x + y = 1
        let equations = [
            Equation::new(-2.0).with_term("x", 1.0),
            Equation::new(1.0).with_term("y", 1.0),
            Equation::new(-1.0).with_term("x", 1.0).with_term("y", 1.0),
        ];
        let solution = LinearSystem::assemble(&equations)
            .solve_overdetermined(DEFAULT_SINGULAR_TOLERANCE, 1.0e-9)
            .expect("consistent");
        assert_relative_eq!(solution[0].1, 2.0, epsilon = 1.0e-9);
        assert_relative_eq!(solution[1].1, -1.0, epsilon = 1.0e-9);
    }

    #[test]
    fn contradictory_surplus_equations_are_rejected() {
        // x = 2, x = 3
        let equations = [
            Equation::new(-2.0).with_term("x", 1.0),
            Equation::new(-3.0).with_term("x", 1.0),
        ];
        let error = LinearSystem::assemble(&equations)
            .solve_overdetermined(DEFAULT_SINGULAR_TOLERANCE, 1.0e-9)
            .expect_err("inconsistent");
        assert!(matches!(error, EquationError::Inconsistent { .. }));
    }

    #[test]
    fn surplus_equations_do_not_hide_a_free_unknown() {
        // x = 1 twice, y never constrained beyond a zero coefficient
        let equations = [
            Equation::new(-1.0).with_term("x", 1.0).with_term("y", 0.0),
            Equation::new(-1.0).with_term("x", 1.0),
            Equation::new(-1.0).with_term("x", 1.0),
        ];
        assert_eq!(
            LinearSystem::assemble(&equations)
                .solve_overdetermined(DEFAULT_SINGULAR_TOLERANCE, 1.0e-9),
            Err(EquationError::Singular)
        );
    }

    #[test]
    fn large_coefficients_in_one_row_do_not_make_the_system_singular() {
        // 1e6·x + (1e6 + 10)·y = 1e7 + 50, x + y = 10
        let equations = [
            Equation::new(-1.0e7 - 50.0)
                .with_term("x", 1.0e6)
                .with_term("y", 1.0e6 + 10.0),
            Equation::new(-10.0).with_term("x", 1.0).with_term("y", 1.0),
        ];
        let solution = solve_equations(&equations, DEFAULT_SINGULAR_TOLERANCE).expect("unique");
        assert_relative_eq!(solution[0].1, 5.0, epsilon = 1.0e-6);
        assert_relative_eq!(solution[1].1, 5.0, epsilon = 1.0e-6);
    }

    #[test]
    fn zero_row_is_singular() {
        let equations = [
            Equation::new(1.0).with_term("x", 1.0).with_term("y", 0.0),
            Equation::new(2.0).with_term("x", 0.0),
        ];
        assert_eq!(
            solve_equations(&equations, DEFAULT_SINGULAR_TOLERANCE),
            Err(EquationError::Singular)
        );
    }

    #[test]
    fn empty_system_is_trivially_solved() {
        let solution = solve_equations::<&str>(&[], DEFAULT_SINGULAR_TOLERANCE).expect("empty");
        assert!(solution.is_empty());
    }

    #[test]
    fn display_lists_terms_then_constant() {
        let equation = Equation::new(-10.0).with_term("B_y", 1.0);
        assert_eq!(format!("{equation:.1}"), "1.0·B_y + -10.0 = 0");
    }
}
