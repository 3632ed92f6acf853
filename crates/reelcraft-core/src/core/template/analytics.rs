//! Catalog Analytics
//!
//! Aggregations over catalog templates: overall statistics and usage
//! breakdowns by category or platform.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::catalog_models::{CatalogTemplate, TemplateCategory};
use crate::core::{TemplateId, Timestamp};

/// Entries in each top-N list
pub const TOP_N: usize = 5;

/// Compact view of a template for ranking lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub id: TemplateId,
    pub name: String,
    pub category: TemplateCategory,
    pub popularity: f64,
    pub usage_count: u64,
    pub created_at: Timestamp,
}

impl From<&CatalogTemplate> for TemplateSummary {
    fn from(t: &CatalogTemplate) -> Self {
        Self {
            id: t.id().to_string(),
            name: t.name().to_string(),
            category: t.category,
            popularity: t.popularity(),
            usage_count: t.usage_count(),
            created_at: t.created_at(),
        }
    }
}

/// Catalog statistics snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStatistics {
    pub total_templates: usize,
    /// Template count per category
    pub by_category: BTreeMap<String, usize>,
    /// Summed usage across templates
    pub total_usage: u64,
    /// Mean rating over templates with at least one review; 0 when none
    pub average_rating: f64,
    pub most_popular: Vec<TemplateSummary>,
    pub most_recent: Vec<TemplateSummary>,
    pub favorites_count: usize,
    /// Distinct categories in use
    pub category_count: usize,
    /// Distinct platforms across all templates
    pub platform_count: usize,
}

/// Usage share of one category or platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageBreakdown {
    pub key: String,
    pub count: u64,
    /// Share of total usage in percent
    pub percentage: f64,
}

/// Orders templates by popularity, highest first. Ties keep input order.
pub fn rank_by_popularity<'a>(
    templates: impl IntoIterator<Item = &'a CatalogTemplate>,
) -> Vec<&'a CatalogTemplate> {
    let mut ranked: Vec<_> = templates.into_iter().collect();
    ranked.sort_by(|a, b| b.popularity().total_cmp(&a.popularity()));
    ranked
}

/// Orders templates by creation time, newest first
pub fn rank_by_recency<'a>(
    templates: impl IntoIterator<Item = &'a CatalogTemplate>,
) -> Vec<&'a CatalogTemplate> {
    let mut ranked: Vec<_> = templates.into_iter().collect();
    ranked.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    ranked
}

/// Computes the statistics snapshot
pub fn statistics<'a>(
    templates: impl IntoIterator<Item = &'a CatalogTemplate> + Clone,
    favorites_count: usize,
) -> CatalogStatistics {
    let mut by_category = BTreeMap::new();
    let mut platforms = BTreeSet::new();
    let mut total_templates = 0;
    let mut total_usage = 0;
    let mut rating_sum = 0.0;
    let mut rated = 0usize;

    for t in templates.clone() {
        total_templates += 1;
        *by_category.entry(t.category.to_string()).or_insert(0) += 1;
        platforms.extend(t.platforms.iter().map(String::as_str));
        total_usage += t.usage_count();
        if t.reviews() > 0 {
            rating_sum += t.rating();
            rated += 1;
        }
    }

    CatalogStatistics {
        total_templates,
        category_count: by_category.len(),
        by_category,
        total_usage,
        average_rating: if rated > 0 {
            rating_sum / rated as f64
        } else {
            0.0
        },
        most_popular: rank_by_popularity(templates.clone())
            .into_iter()
            .take(TOP_N)
            .map(TemplateSummary::from)
            .collect(),
        most_recent: rank_by_recency(templates)
            .into_iter()
            .take(TOP_N)
            .map(TemplateSummary::from)
            .collect(),
        favorites_count,
        platform_count: platforms.len(),
    }
}

/// Usage per category, largest first. Empty when nothing was used.
pub fn category_usage<'a>(
    templates: impl IntoIterator<Item = &'a CatalogTemplate>,
) -> Vec<UsageBreakdown> {
    let mut counts = BTreeMap::new();
    let mut total = 0;
    for t in templates {
        *counts.entry(t.category.to_string()).or_insert(0) += t.usage_count();
        total += t.usage_count();
    }
    breakdown(counts, total)
}

/// Usage per platform, largest first. Empty when nothing was used.
///
/// A template counts its full usage toward each of its platforms, so the
/// percentages may sum past 100.
pub fn platform_usage<'a>(
    templates: impl IntoIterator<Item = &'a CatalogTemplate>,
) -> Vec<UsageBreakdown> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut total = 0;
    for t in templates {
        for platform in &t.platforms {
            *counts.entry(platform.clone()).or_insert(0) += t.usage_count();
        }
        total += t.usage_count();
    }
    breakdown(counts, total)
}

fn breakdown(counts: BTreeMap<String, u64>, total: u64) -> Vec<UsageBreakdown> {
    if total == 0 {
        return Vec::new();
    }

    let mut rows: Vec<UsageBreakdown> = counts
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(key, count)| UsageBreakdown {
            key,
            count,
            percentage: count as f64 / total as f64 * 100.0,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}
