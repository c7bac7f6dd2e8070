// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Feature tree walker
//!
//! Visits a feature and all nested children depth-first in document order.
//! Fallible work (template lookups, depth checks) runs in a planning pass
//! before any coordinate changes, so a failing feature stays untouched.

use crate::corrector::{HeightCorrector, HeightMode};
use crate::error::HeightChangeError;
use crate::templates::GeometryTemplateIndex;
use citymodel_model::{Feature, Geometry, ImplicitGeometry, Z};

/// Default limit for feature nesting
///
/// Below the roughly 57 child levels a JSONL line can still decode.
pub const DEFAULT_MAX_DEPTH: usize = 48;

/// Counts gathered while visiting one feature
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VisitReport {
    /// Features visited, including the root
    pub features: usize,
    /// Explicit coordinates corrected
    pub coordinates: usize,
    /// Implicit geometries moved
    pub implicit_geometries: usize,
    /// Non-finite Z values left untouched
    pub non_finite: usize,
}

/// Applies a [`HeightCorrector`] to every geometry in a feature tree
pub struct FeatureWalker<'a> {
    corrector: HeightCorrector,
    templates: Option<&'a GeometryTemplateIndex>,
    max_depth: usize,
}

impl<'a> FeatureWalker<'a> {
    /// Create a walker without template resolution
    pub fn new(corrector: HeightCorrector) -> Self {
        Self {
            corrector,
            templates: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Resolve implicit geometries against an index (absolute mode)
    pub fn with_templates(mut self, templates: Option<&'a GeometryTemplateIndex>) -> Self {
        self.templates = templates;
        self
    }

    /// Set the nesting limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Correct all heights of a feature tree
    ///
    /// On error the feature is left exactly as it was.
    pub fn visit(&self, feature: &mut Feature) -> Result<VisitReport, HeightChangeError> {
        let placements = self.plan(feature)?;
        Ok(self.apply(feature, &placements))
    }

    /// Compute target reference Z values for implicit geometries
    ///
    /// Only absolute mode places implicit geometries independently; the
    /// returned values follow the traversal order of [`apply`](Self::apply).
    fn plan(&self, root: &Feature) -> Result<Vec<f64>, HeightChangeError> {
        let absolute = self.corrector.mode() == HeightMode::Absolute;
        let mut placements = Vec::new();
        let mut stack = vec![(root, 0usize)];

        while let Some((node, depth)) = stack.pop() {
            if depth > self.max_depth {
                return Err(HeightChangeError::DepthLimitExceeded {
                    feature: node.id.clone(),
                    max_depth: self.max_depth,
                });
            }

            if absolute {
                for implicit in node.geometry.iter().filter_map(Geometry::as_implicit) {
                    placements.push(self.place_implicit(&node.id, implicit)?);
                }
            }

            stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        }

        Ok(placements)
    }

    /// Reference Z that puts the template's lowest point at the offset
    fn place_implicit(
        &self,
        feature_id: &str,
        implicit: &ImplicitGeometry,
    ) -> Result<f64, HeightChangeError> {
        let template = self
            .templates
            .and_then(|index| index.get(&implicit.template))
            .ok_or_else(|| HeightChangeError::unresolved(feature_id, implicit.template.clone()))?;

        let lowest = template
            .lowest_z_under(implicit)
            .ok_or_else(|| HeightChangeError::empty_template(feature_id, implicit.template.clone()))?;

        Ok(self.corrector.offset() - lowest)
    }

    /// Mutate coordinates; cannot fail
    fn apply(&self, root: &mut Feature, placements: &[f64]) -> VisitReport {
        let mut report = VisitReport::default();
        let mut placements = placements.iter();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            report.features += 1;
            let Feature {
                geometry, children, ..
            } = node;

            for geometry in geometry.iter_mut() {
                match geometry {
                    Geometry::Explicit(explicit) => {
                        for coord in explicit.coords_mut() {
                            if self.corrector.correct_coord(coord) {
                                report.coordinates += 1;
                            } else {
                                report.non_finite += 1;
                            }
                        }
                    }
                    Geometry::Implicit(implicit) => {
                        let point = &mut implicit.reference_point;
                        match self.corrector.mode() {
                            HeightMode::Relative => {
                                if !self.corrector.correct_coord(point) {
                                    report.non_finite += 1;
                                    continue;
                                }
                            }
                            HeightMode::Absolute => {
                                if let Some(z) = placements.next() {
                                    point[Z] = *z;
                                }
                            }
                        }
                        report.implicit_geometries += 1;
                    }
                }
            }

            stack.extend(children.iter_mut().rev());
        }

        report
    }
}
