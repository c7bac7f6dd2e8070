// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry template index
//!
//! Resolves implicit-geometry template identifiers to control points plus a
//! precomputed lowest local Z.

use crate::error::{PipelineError, Result};
use citymodel_model::{
    lowest_z, DocumentFormat, GeometryTemplate, ImplicitGeometry, TemplateId, TemplateScan,
};
use log::{debug, warn};
use nalgebra::{Matrix4, Point3};
use rustc_hash::FxHashMap;
use std::path::Path;

/// Resolved template: local control points and their lowest Z
#[derive(Clone, Debug)]
pub struct Template {
    points: Vec<Point3<f64>>,
    min_z: Option<f64>,
}

impl Template {
    /// Resolve a template from its decoded form
    pub fn from_geometry(template: &GeometryTemplate) -> Self {
        let points: Vec<Point3<f64>> = template
            .coords()
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();

        let min_z = lowest_z(template.coords());
        Self { points, min_z }
    }

    /// Local control points
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Lowest local Z
    pub fn min_z(&self) -> Option<f64> {
        self.min_z
    }

    /// Lowest Z of the template after applying an instance transform
    ///
    /// The matrix is row-major. Identity transforms use the cached extent.
    pub fn lowest_z_under(&self, instance: &ImplicitGeometry) -> Option<f64> {
        if instance.has_identity_transform() {
            return self.min_z;
        }

        let matrix = Matrix4::from_row_slice(&instance.matrix());
        self.points
            .iter()
            .map(|p| matrix.transform_point(p).z)
            .filter(|z| z.is_finite())
            .fold(None, |acc: Option<f64>, z| Some(acc.map_or(z, |m| m.min(z))))
    }
}

/// Template identifier -> resolved template
#[derive(Clone, Debug, Default)]
pub struct GeometryTemplateIndex {
    templates: FxHashMap<TemplateId, Template>,
    observed_lower_z: Option<f64>,
}

impl GeometryTemplateIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index with a pre-scan of the document
    ///
    /// Fails with [`PipelineError::TemplateRead`] if the pre-scan cannot read
    /// the source.
    pub fn build(format: &dyn DocumentFormat, path: &Path) -> Result<Self> {
        debug!("Reading implicit geometries from '{}'.", path.display());
        let scan = format
            .scan_templates(path)
            .map_err(PipelineError::TemplateRead)?;
        let index = Self::from_scan(scan);
        debug!("Resolved {} geometry template(s).", index.len());
        Ok(index)
    }

    /// Build the index from an existing scan result
    pub fn from_scan(scan: TemplateScan) -> Self {
        let mut index = Self::new();
        for template in &scan.templates {
            index.insert(template);
        }
        index.observed_lower_z = scan.observed_lower_z;
        index
    }

    /// Add a template, replacing any earlier one with the same identifier
    pub fn insert(&mut self, template: &GeometryTemplate) {
        let resolved = Template::from_geometry(template);
        if self.templates.insert(template.id.clone(), resolved).is_some() {
            warn!("Duplicate geometry template '{}'; using the last definition.", template.id);
        }
    }

    /// Look up a template
    pub fn get(&self, id: &TemplateId) -> Option<&Template> {
        self.templates.get(id)
    }

    /// Number of templates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Lowest explicit feature Z seen during the pre-scan
    pub fn observed_lower_z(&self) -> Option<f64> {
        self.observed_lower_z
    }
}
