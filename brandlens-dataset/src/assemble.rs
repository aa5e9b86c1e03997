//! Analytic dataset assembly
//!
//! Left-joins each provider's long-format mentions with its responses,
//! stacks the two sources, joins brand-level features and brand-by-topic
//! hit counts, and writes one wide CSV sorted by (query_id, source, brand).
//! Rating and review-count columns arrive and leave as comma-decimal text
//! for spreadsheet consumption.

use std::collections::HashMap;
use std::path::PathBuf;

use brandlens_core::{BrandLensError, Provider, ResponseRecord};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::io::{read_rows, write_rows};
use crate::locale::{coerce_numeric, format_optional_comma_decimal, parse_comma_decimal};
use crate::mentions::MentionRow;

/// Input and output paths for one assembly run
#[derive(Debug, Clone)]
pub struct AssembleInputs {
    pub responses_chatgpt: PathBuf,
    pub responses_gemini: PathBuf,
    pub mentions_chatgpt: PathBuf,
    pub mentions_gemini: PathBuf,
    pub brand_features: PathBuf,
    pub topic_hits: PathBuf,
    pub output: PathBuf,
}

/// Brand-level metrics (Trustpilot, G2, Lighthouse), one row per brand.
/// Rating and count columns are read as raw text: the export uses comma
/// decimals and empty cells.
#[derive(Debug, Clone, Deserialize)]
struct BrandFeatureRow {
    brand: String,
    #[serde(default)]
    avgrating_b_tp: Option<String>,
    #[serde(default)]
    reviewcount_b_tp: Option<String>,
    #[serde(default)]
    avgrating_b_g2: Option<String>,
    #[serde(default)]
    reviewcount_b_g2: Option<String>,
    #[serde(default)]
    lighthouse_seo_b: Option<f64>,
}

/// Per-(brand, topic) visibility counts from external channel scans
#[derive(Debug, Clone, Deserialize)]
struct TopicHitsRow {
    brand: String,
    topic: String,
    #[serde(default)]
    listicle_topic_hits_bt: Option<String>,
    #[serde(default)]
    reddit_topic_hits_bt: Option<String>,
    #[serde(default)]
    youtube_topic_hits_bt: Option<String>,
    #[serde(default)]
    linkedin_topic_hits_bt: Option<String>,
    #[serde(default)]
    domain_topic_hits_bt: Option<String>,
}

/// One row of the final wide dataset; field order is the column order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRow {
    pub query_id: String,
    pub source: String,
    pub query_text: String,
    pub topic: String,
    pub response_text: String,
    pub brand: String,
    pub mention: u8,
    pub avgrating_b_tp: String,
    pub reviewcount_b_tp: String,
    pub avgrating_b_g2: String,
    pub reviewcount_b_g2: String,
    pub lighthouse_seo_b: Option<f64>,
    pub listicle_topic_hits_bt: f64,
    pub reddit_topic_hits_bt: f64,
    pub youtube_topic_hits_bt: f64,
    pub linkedin_topic_hits_bt: f64,
    pub domain_topic_hits_bt: f64,
}

/// Assemble the wide dataset. Returns the number of rows written.
pub fn assemble(inputs: &AssembleInputs) -> Result<usize, BrandLensError> {
    let responses_chatgpt: Vec<ResponseRecord> = read_rows(&inputs.responses_chatgpt)?;
    let responses_gemini: Vec<ResponseRecord> = read_rows(&inputs.responses_gemini)?;
    let mentions_chatgpt: Vec<MentionRow> = read_rows(&inputs.mentions_chatgpt)?;
    let mentions_gemini: Vec<MentionRow> = read_rows(&inputs.mentions_gemini)?;
    let brand_features: Vec<BrandFeatureRow> = read_rows(&inputs.brand_features)?;
    let topic_hits: Vec<TopicHitsRow> = read_rows(&inputs.topic_hits)?;

    info!(
        "Assembling: {}+{} responses, {}+{} mentions, {} brands, {} topic-hit rows",
        responses_chatgpt.len(),
        responses_gemini.len(),
        mentions_chatgpt.len(),
        mentions_gemini.len(),
        brand_features.len(),
        topic_hits.len()
    );

    let features_by_brand: HashMap<&str, &BrandFeatureRow> = brand_features
        .iter()
        .map(|row| (row.brand.as_str(), row))
        .collect();
    let hits_by_key: HashMap<(&str, &str), &TopicHitsRow> = topic_hits
        .iter()
        .map(|row| ((row.brand.as_str(), row.topic.as_str()), row))
        .collect();

    let mut rows = Vec::new();
    let sources = [
        (Provider::OpenAi.source_tag(), &mentions_chatgpt, &responses_chatgpt),
        (Provider::Gemini.source_tag(), &mentions_gemini, &responses_gemini),
    ];

    for (source, mentions, responses) in sources {
        let responses_by_id: HashMap<&str, &ResponseRecord> = responses
            .iter()
            .map(|row| (row.query_id.as_str(), row))
            .collect();

        for mention in mentions.iter() {
            let response = responses_by_id.get(mention.query_id.as_str()).copied();
            let feature = features_by_brand.get(mention.brand.as_str()).copied();
            let topic = response.map(|r| r.topic.as_str()).unwrap_or_default();
            let hits = hits_by_key.get(&(mention.brand.as_str(), topic)).copied();

            rows.push(build_row(source, mention, response, feature, hits));
        }
    }

    rows.sort_by(|a, b| {
        (&a.query_id, &a.source, &a.brand).cmp(&(&b.query_id, &b.source, &b.brand))
    });

    write_rows(&inputs.output, &rows)?;
    info!("Wrote {} rows to {}", rows.len(), inputs.output.display());

    Ok(rows.len())
}

fn build_row(
    source: &str,
    mention: &MentionRow,
    response: Option<&ResponseRecord>,
    feature: Option<&BrandFeatureRow>,
    hits: Option<&TopicHitsRow>,
) -> DatasetRow {
    let rating = |raw: Option<&Option<String>>| {
        format_optional_comma_decimal(
            raw.and_then(|opt| opt.as_deref()).and_then(parse_comma_decimal),
        )
    };
    let count = |raw: Option<&Option<String>>| {
        format_optional_comma_decimal(Some(coerce_numeric(raw.and_then(|opt| opt.as_deref()))))
    };
    let hit = |raw: Option<&Option<String>>| coerce_numeric(raw.and_then(|opt| opt.as_deref()));

    DatasetRow {
        query_id: mention.query_id.clone(),
        source: source.to_string(),
        query_text: response.map(|r| r.query_text.clone()).unwrap_or_default(),
        topic: response.map(|r| r.topic.clone()).unwrap_or_default(),
        response_text: response.map(|r| r.response_text.clone()).unwrap_or_default(),
        brand: mention.brand.clone(),
        mention: mention.mention,
        avgrating_b_tp: rating(feature.map(|f| &f.avgrating_b_tp)),
        reviewcount_b_tp: count(feature.map(|f| &f.reviewcount_b_tp)),
        avgrating_b_g2: rating(feature.map(|f| &f.avgrating_b_g2)),
        reviewcount_b_g2: count(feature.map(|f| &f.reviewcount_b_g2)),
        lighthouse_seo_b: feature.and_then(|f| f.lighthouse_seo_b),
        listicle_topic_hits_bt: hit(hits.map(|h| &h.listicle_topic_hits_bt)),
        reddit_topic_hits_bt: hit(hits.map(|h| &h.reddit_topic_hits_bt)),
        youtube_topic_hits_bt: hit(hits.map(|h| &h.youtube_topic_hits_bt)),
        linkedin_topic_hits_bt: hit(hits.map(|h| &h.linkedin_topic_hits_bt)),
        domain_topic_hits_bt: hit(hits.map(|h| &h.domain_topic_hits_bt)),
    }
}
