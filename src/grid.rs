use crate::error::{RelaxError, Result};
use ndarray::Array2;
use std::fmt;

/// Whether a cell's potential is held fixed or relaxed from its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Boundary,
    Interior,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub potential: f64,
    pub kind: CellKind,
}

impl Cell {
    pub fn new(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            potential: 0.0,
            kind: CellKind::Interior,
        }
    }

    fn fix(&mut self, value: f64) {
        self.potential = value;
        self.kind = CellKind::Boundary;
    }
}

/// Inner conductor rectangle: origin `x` and extent `w` along rows,
/// origin `y` and extent `h` along columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cavity {
    pub x: usize,
    pub w: usize,
    pub y: usize,
    pub h: usize,
}

impl Cavity {
    pub fn new(x: usize, w: usize, y: usize, h: usize) -> Self {
        Self { x, w, y, h }
    }

    /// Last row index covered by the cavity.
    pub fn x_end(&self) -> usize {
        self.x + self.w - 1
    }

    /// Last column index covered by the cavity.
    pub fn y_end(&self) -> usize {
        self.y + self.h - 1
    }
}

/// Discretised rectangular domain bounded by an outer conductor and
/// containing one rectangular inner conductor.
#[derive(Debug, Clone)]
pub struct Grid {
    pub nx: usize, // Number of rows
    pub ny: usize, // Number of columns
    cavity: Cavity,
    cells: Array2<Cell>,
}

impl Grid {
    /// Allocate an `nx` x `ny` grid of zero-potential interior cells.
    pub fn new(
        nx: usize,
        ny: usize,
        cavity_x: usize,
        cavity_w: usize,
        cavity_y: usize,
        cavity_h: usize,
    ) -> Result<Self> {
        let cavity = Cavity::new(cavity_x, cavity_w, cavity_y, cavity_h);
        Self::with_cavity(nx, ny, cavity)
    }

    pub fn with_cavity(nx: usize, ny: usize, cavity: Cavity) -> Result<Self> {
        if nx == 0 || ny == 0 {
            return Err(RelaxError::invalid_geometry(format!(
                "grid dimensions must be positive (nx={}, ny={})",
                nx, ny
            )));
        }
        if cavity.w == 0 || cavity.h == 0 {
            return Err(RelaxError::invalid_geometry(format!(
                "cavity extent must be positive (w={}, h={})",
                cavity.w, cavity.h
            )));
        }
        let fits = |origin: usize, extent: usize, limit: usize| {
            origin.checked_add(extent).is_some_and(|end| end <= limit)
        };
        if !fits(cavity.x, cavity.w, nx) || !fits(cavity.y, cavity.h, ny) {
            return Err(RelaxError::invalid_geometry(format!(
                "cavity at ({}, {}) with extent {}x{} does not fit in a {}x{} grid",
                cavity.x, cavity.y, cavity.w, cavity.h, nx, ny
            )));
        }

        let cells = Array2::from_shape_fn((nx, ny), |(row, col)| Cell::new(row, col));
        Ok(Self {
            nx,
            ny,
            cavity,
            cells,
        })
    }

    pub fn cavity(&self) -> Cavity {
        self.cavity
    }

    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.nx && col < self.ny
    }

    /// True for cells on the outermost rows and columns.
    pub fn on_edge(&self, row: usize, col: usize) -> bool {
        row == 0 || col == 0 || row == self.nx - 1 || col == self.ny - 1
    }

    /// Fix the outer conductor: every cell on the four edges becomes a
    /// boundary cell held at `value`.
    pub fn set_outer(&mut self, value: f64) {
        let (nx, ny) = (self.nx, self.ny);
        for col in 0..ny {
            self.cells[[0, col]].fix(value);
            self.cells[[nx - 1, col]].fix(value);
        }
        for row in 0..nx {
            self.cells[[row, 0]].fix(value);
            self.cells[[row, ny - 1]].fix(value);
        }
    }

    /// Fix the inner conductor. Rows `x` and `x+w-1` are marked over columns
    /// `y..=y+h-2`; columns `y` and `y+h-1` are marked over rows `x..=x+w-1`.
    /// Call after [`Grid::set_outer`] so the cavity marking is not overwritten.
    pub fn set_inner(&mut self, value: f64) {
        let Cavity { x, w, y, h } = self.cavity;

        for col in y..y + h - 1 {
            self.cells[[x, col]].fix(value);
            self.cells[[x + w - 1, col]].fix(value);
        }
        for row in x..x + w {
            self.cells[[row, y]].fix(value);
            self.cells[[row, y + h - 1]].fix(value);
        }
    }

    /// Copy of the current potentials, indexed `[row, col]`.
    pub fn snapshot(&self) -> Array2<f64> {
        self.cells.map(|cell| cell.potential)
    }

    pub fn cell(&self, row: usize, col: usize) -> Result<&Cell> {
        self.cells
            .get((row, col))
            .ok_or(RelaxError::IndexOutOfRange {
                row,
                col,
                nx: self.nx,
                ny: self.ny,
            })
    }

    pub fn cell_kind(&self, row: usize, col: usize) -> Result<CellKind> {
        self.cell(row, col).map(|cell| cell.kind)
    }

    pub fn cell_value(&self, row: usize, col: usize) -> Result<f64> {
        self.cell(row, col).map(|cell| cell.potential)
    }

    /// Sum of every cell's potential.
    pub fn total_potential(&self) -> f64 {
        self.cells.iter().map(|cell| cell.potential).sum()
    }

    pub fn interior_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.kind == CellKind::Interior)
            .count()
    }

    pub(crate) fn cells(&self) -> &Array2<Cell> {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut Array2<Cell> {
        &mut self.cells
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Grid {}x{}:", self.nx, self.ny)?;
        for row in self.cells.rows() {
            let line: Vec<String> = row
                .iter()
                .map(|cell| format!("{:6.1}", cell.potential))
                .collect();
            writeln!(f, "[{}]", line.join(" "))?;
        }
        Ok(())
    }
}
