use std::fmt;

use crate::geofile::feature::GeoFeature;

const APPROVED_STATUS: &str = "Approved";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Approved,
    Pending,
}

impl StatusClass {
    pub fn name(&self) -> &'static str {
        match self {
            StatusClass::Approved => "approved",
            StatusClass::Pending => "pending",
        }
    }
}

/// What a claim marker shows when clicked.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupContent {
    pub title: String,
    pub holder_name: String,
    pub land_area: String,
    pub status: String,
    pub status_class: StatusClass,
    /// "lat, lng" with four decimals, point features only.
    pub location: Option<String>,
}

/// Build the popup for a feature. Every attribute is optional and falls back to a placeholder.
pub fn popup_content(feature: &GeoFeature) -> PopupContent {
    let properties = &feature.properties;
    let district = properties
        .district()
        .unwrap_or_else(|| "Unknown".to_string());
    let title = match properties.state() {
        Some(state) => format!("{}, {}", district, state),
        None => district,
    };
    // Records from the read-only dashboard without a status are approved claims.
    let status = properties
        .status()
        .unwrap_or_else(|| APPROVED_STATUS.to_string());
    let status_class = if status == APPROVED_STATUS {
        StatusClass::Approved
    } else {
        StatusClass::Pending
    };
    PopupContent {
        title,
        holder_name: properties.holder_name().unwrap_or_else(|| "N/A".to_string()),
        land_area: properties.land_area().unwrap_or_else(|| "N/A".to_string()),
        status,
        status_class,
        location: feature
            .point()
            .map(|point| format!("{:.4}, {:.4}", point.y(), point.x())),
    }
}

impl fmt::Display for PopupContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "Patta Holder: {}", self.holder_name)?;
        writeln!(f, "Land Area: {}", self.land_area)?;
        write!(f, "Status: {}", self.status)?;
        if let Some(location) = &self.location {
            write!(f, "\nLocation: {}", location)?;
        }
        Ok(())
    }
}
