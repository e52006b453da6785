/// Numeric storage class of a MATLAB array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatClass {
    /// `double`
    Double,
    /// `single`
    Single,
    /// `int8`
    Int8,
    /// `uint8` (also `logical`)
    UInt8,
    /// `int16`
    Int16,
    /// `uint16`
    UInt16,
    /// `int32`
    Int32,
    /// `uint32`
    UInt32,
    /// `int64`
    Int64,
    /// `uint64`
    UInt64,
}

impl MatClass {
    /// Numeric class from an `mxCLASS` code
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            6 => Some(MatClass::Double),
            7 => Some(MatClass::Single),
            8 => Some(MatClass::Int8),
            9 => Some(MatClass::UInt8),
            10 => Some(MatClass::Int16),
            11 => Some(MatClass::UInt16),
            12 => Some(MatClass::Int32),
            13 => Some(MatClass::UInt32),
            14 => Some(MatClass::Int64),
            15 => Some(MatClass::UInt64),
            _ => None,
        }
    }
}

/// A decoded MATLAB array. Multi-element arrays are stored column-major,
/// as MATLAB writes them.
#[derive(Debug, Clone, PartialEq)]
pub enum MatArray {
    /// Numeric or logical array, widened to `f64` (real part only)
    Numeric {
        /// Storage class in the file
        class: MatClass,
        /// Dimensions
        dims: Vec<usize>,
        /// Column-major values
        data: Vec<f64>,
    },
    /// Character array; the text is in column-major order
    Char {
        /// Dimensions
        dims: Vec<usize>,
        /// Characters
        text: String,
    },
    /// Cell array
    Cell {
        /// Dimensions
        dims: Vec<usize>,
        /// Column-major cells
        cells: Vec<MatArray>,
    },
    /// Struct array
    Struct {
        /// Dimensions
        dims: Vec<usize>,
        /// Field names in declaration order
        field_names: Vec<String>,
        /// Column-major elements, each holding one array per field; empty
        /// when the struct has no fields
        elements: Vec<Vec<MatArray>>,
    },
    /// Zero-byte matrix element
    Empty,
}

impl MatArray {
    /// Dimensions (empty for [`MatArray::Empty`])
    pub fn dims(&self) -> &[usize] {
        match self {
            MatArray::Numeric { dims, .. }
            | MatArray::Char { dims, .. }
            | MatArray::Cell { dims, .. }
            | MatArray::Struct { dims, .. } => dims,
            MatArray::Empty => &[],
        }
    }

    /// Short description of the array kind, for messages
    pub fn kind(&self) -> &'static str {
        match self {
            MatArray::Numeric { .. } => "numeric array",
            MatArray::Char { .. } => "char array",
            MatArray::Cell { .. } => "cell array",
            MatArray::Struct { .. } => "struct array",
            MatArray::Empty => "empty array",
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match self.dims() {
            [] => 0,
            dims => dims.iter().product(),
        }
    }

    /// Whether the array holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the first dimension
    pub fn rows(&self) -> usize {
        self.dims().first().copied().unwrap_or(0)
    }

    /// Product of the trailing dimensions
    pub fn cols(&self) -> usize {
        match self.dims() {
            [] => 0,
            [_, rest @ ..] => rest.iter().product(),
        }
    }

    fn linear_index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows() && col < self.cols()).then(|| row + col * self.rows())
    }

    /// Cell content at `(row, col)`
    pub fn cell(&self, row: usize, col: usize) -> Option<&MatArray> {
        match self {
            MatArray::Cell { cells, .. } => cells.get(self.linear_index(row, col)?),
            _ => None,
        }
    }

    /// Field names of a struct array
    pub fn field_names(&self) -> &[String] {
        match self {
            MatArray::Struct { field_names, .. } => field_names,
            _ => &[],
        }
    }

    /// Field value of struct element `(row, col)` by name
    pub fn field(&self, row: usize, col: usize, name: &str) -> Option<&MatArray> {
        let position = self.field_names().iter().position(|f| f == name)?;
        self.field_at(row, col, position)
    }

    /// Field value of struct element `(row, col)` by declaration position
    pub fn field_at(&self, row: usize, col: usize, position: usize) -> Option<&MatArray> {
        match self {
            MatArray::Struct { elements, .. } => {
                elements.get(self.linear_index(row, col)?)?.get(position)
            }
            _ => None,
        }
    }

    /// Numeric element at `(row, col)`
    pub fn numeric_at(&self, row: usize, col: usize) -> Option<f64> {
        match self {
            MatArray::Numeric { data, .. } => data.get(self.linear_index(row, col)?).copied(),
            _ => None,
        }
    }

    /// First element of a numeric array
    pub fn scalar(&self) -> Option<f64> {
        self.numeric_at(0, 0)
    }

    /// Text of a char array
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MatArray::Char { text, .. } => Some(text),
            _ => None,
        }
    }
}
