use crate::flows::KnowledgeEntry;

/// What the assistant knows about when no knowledge file is given.
const FEATURES: &[(&str, &str)] = &[
    (
        "Idea Refinement",
        "Turns a raw idea into a refined concept with associated concepts, potential pivots, \
         a market potential score, a SWOT snippet, a competitor teaser, and viability factor scores.",
    ),
    (
        "Safety Analysis",
        "Reviews an idea for potential misuse, safety and alignment risks, and ethical considerations. \
         Runs automatically when a refined idea is saved.",
    ),
    (
        "Development Guide",
        "Writes a Markdown development guide for a refined idea, optionally tailored to a target \
         audience and a preferred tech stack.",
    ),
    (
        "Business Proposal",
        "Writes a business proposal and a pitch deck outline in Markdown from a refined idea, its \
         score, SWOT snippet, competitor teaser, and funding goal.",
    ),
    (
        "Image Insights",
        "Analyzes a screenshot or mockup for UI/UX, branding and marketing, visible features, and \
         potential improvements, optionally focused by a question.",
    ),
    (
        "Translation",
        "Translates text into a target language and returns only the translation.",
    ),
    (
        "Saved Ideas",
        "Stores refined ideas with their safety analysis, guide, and proposal so they can be listed, \
         shown, extended, or deleted later.",
    ),
];

pub(super) fn default_knowledge_base() -> Vec<KnowledgeEntry> {
    FEATURES
        .iter()
        .map(|(title, summary)| KnowledgeEntry {
            title: (*title).to_string(),
            summary: (*summary).to_string(),
        })
        .collect()
}
