//! TSPLIB instance loading and tour evaluation.

use std::fs;
use std::path::Path;

use log::debug;

use crate::error::{Error, Result};

/// Symmetric TSP instance backed by a dense distance matrix.
#[derive(Debug, Clone)]
pub struct TspInstance {
    name: String,
    dimension: usize,
    /// Row-major `dimension * dimension`.
    dist: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WeightType {
    Euc2d,
    Explicit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    NodeCoords,
    EdgeWeights,
}

fn malformed(line: usize, message: impl Into<String>) -> Error {
    Error::Instance {
        line,
        message: message.into(),
    }
}

impl TspInstance {
    /// Builds an instance from planar coordinates (Euclidean, unrounded).
    pub fn from_points(name: impl Into<String>, points: &[(f64, f64)]) -> Result<Self> {
        if points.is_empty() {
            return Err(malformed(0, "instance has no cities"));
        }
        let n = points.len();
        let mut dist = vec![0.0; n * n];
        for i in 0..n {
            for j in i + 1..n {
                let (xi, yi) = points[i];
                let (xj, yj) = points[j];
                let d = ((xi - xj).powi(2) + (yi - yj).powi(2)).sqrt();
                dist[i * n + j] = d;
                dist[j * n + i] = d;
            }
        }
        Ok(Self {
            name: name.into(),
            dimension: n,
            dist,
        })
    }

    /// Reads and parses a TSPLIB file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let instance = Self::parse(&text)?;
        debug!(
            "loaded {} ({} cities) from {}",
            instance.name,
            instance.dimension,
            path.display()
        );
        Ok(instance)
    }

    /// Parses TSPLIB text.
    ///
    /// Supports `EDGE_WEIGHT_TYPE: EUC_2D` with a `NODE_COORD_SECTION`, and
    /// `EDGE_WEIGHT_TYPE: EXPLICIT` with a `LOWER_DIAG_ROW`
    /// `EDGE_WEIGHT_SECTION` (diagonal included).
    ///
    /// # Examples
    ///
    /// ```
    /// use u_distanneal::tsp::TspInstance;
    ///
    /// let text = "NAME: square\nTYPE: TSP\nDIMENSION: 4\nEDGE_WEIGHT_TYPE: EUC_2D\n\
    ///             NODE_COORD_SECTION\n1 0 0\n2 0 1\n3 1 1\n4 1 0\nEOF\n";
    /// let tsp = TspInstance::parse(text).unwrap();
    /// assert_eq!(tsp.dimension(), 4);
    /// assert!((tsp.tour_length(&[0, 1, 2, 3]) - 4.0).abs() < 1e-12);
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let mut name = String::from("unnamed");
        let mut dimension: Option<usize> = None;
        let mut weight_type: Option<WeightType> = None;
        let mut section: Option<(usize, Section)> = None;

        let mut lines = text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim()));

        for (line_no, line) in lines.by_ref() {
            if line.is_empty() {
                continue;
            }
            if line == "EOF" {
                break;
            }
            if line.starts_with("NODE_COORD_SECTION") {
                section = Some((line_no, Section::NodeCoords));
                break;
            }
            if line.starts_with("EDGE_WEIGHT_SECTION") {
                section = Some((line_no, Section::EdgeWeights));
                break;
            }

            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| malformed(line_no, format!("expected `KEY: value`, got `{line}`")))?;
            let value = value.trim();
            match key.trim() {
                "NAME" => name = value.to_string(),
                "TYPE" if !value.starts_with("TSP") => {
                    return Err(malformed(line_no, format!("unsupported problem type `{value}`")));
                }
                "DIMENSION" => {
                    let n = value
                        .parse::<usize>()
                        .map_err(|e| malformed(line_no, format!("bad DIMENSION `{value}`: {e}")))?;
                    if n == 0 {
                        return Err(malformed(line_no, "DIMENSION must be positive"));
                    }
                    dimension = Some(n);
                }
                "EDGE_WEIGHT_TYPE" => {
                    weight_type = Some(match value {
                        "EUC_2D" => WeightType::Euc2d,
                        "EXPLICIT" => WeightType::Explicit,
                        other => {
                            return Err(malformed(
                                line_no,
                                format!("unsupported EDGE_WEIGHT_TYPE `{other}`"),
                            ))
                        }
                    });
                }
                "EDGE_WEIGHT_FORMAT" if value != "LOWER_DIAG_ROW" => {
                    return Err(malformed(
                        line_no,
                        format!("unsupported EDGE_WEIGHT_FORMAT `{value}`"),
                    ));
                }
                // TYPE, COMMENT, DISPLAY_DATA_TYPE and the rest carry nothing
                // the distance matrix needs.
                _ => {}
            }
        }

        let (section_line, section) =
            section.ok_or_else(|| malformed(0, "no NODE_COORD_SECTION or EDGE_WEIGHT_SECTION"))?;
        let n = dimension.ok_or_else(|| malformed(section_line, "DIMENSION missing"))?;
        let weight_type =
            weight_type.ok_or_else(|| malformed(section_line, "EDGE_WEIGHT_TYPE missing"))?;

        let expected_section = match weight_type {
            WeightType::Euc2d => Section::NodeCoords,
            WeightType::Explicit => Section::EdgeWeights,
        };
        if section != expected_section {
            return Err(malformed(
                section_line,
                format!("{weight_type:?} instance cannot use {section:?}"),
            ));
        }

        let mut tokens: Vec<(usize, f64)> = Vec::new();
        for (line_no, line) in lines {
            if line == "EOF" || line.ends_with("_SECTION") {
                break;
            }
            for tok in line.split_whitespace() {
                let value = tok
                    .parse::<f64>()
                    .map_err(|e| malformed(line_no, format!("bad number `{tok}`: {e}")))?;
                tokens.push((line_no, value));
            }
        }
        let last_line = tokens.last().map_or(section_line, |&(line, _)| line);

        match section {
            Section::NodeCoords => {
                if tokens.len() < 3 * n {
                    return Err(malformed(
                        last_line,
                        format!("expected {n} coordinates, found {}", tokens.len() / 3),
                    ));
                }
                let points: Vec<(f64, f64)> = tokens
                    .chunks(3)
                    .take(n)
                    .map(|node| (node[1].1, node[2].1))
                    .collect();
                Self::from_points(name, &points)
            }
            Section::EdgeWeights => {
                let needed = n * (n + 1) / 2;
                if tokens.len() < needed {
                    return Err(malformed(
                        last_line,
                        format!("expected {needed} edge weights, found {}", tokens.len()),
                    ));
                }
                let mut dist = vec![0.0; n * n];
                let mut weights = tokens.iter().map(|&(_, w)| w);
                for i in 0..n {
                    for j in 0..=i {
                        let w = weights.next().unwrap_or_default();
                        dist[i * n + j] = w;
                        dist[j * n + i] = w;
                    }
                }
                Ok(Self {
                    name,
                    dimension: n,
                    dist,
                })
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of cities.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.dist[i * self.dimension + j]
    }

    /// Length of the closed tour visiting `tour` in order.
    pub fn tour_length(&self, tour: &[usize]) -> f64 {
        match tour {
            [] | [_] => 0.0,
            [first, .., last] => {
                let open: f64 = tour.windows(2).map(|w| self.distance(w[0], w[1])).sum();
                open + self.distance(*last, *first)
            }
        }
    }
}
