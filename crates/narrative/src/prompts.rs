//! Generation prompts for the three narrative blocks.

use dossier_core::NarrativeSection;

pub const SYSTEM_PROMPT: &str =
    "You are a research assistant specializing in economic models of internet pricing.";

/// Build the user prompt for one section over the digested corpus.
pub fn section_prompt(section: NarrativeSection, papers_count: usize, digest: &str) -> String {
    let mut prompt = format!(
        "You are an expert researcher synthesizing findings from multiple scientific papers \
         about internet and bandwidth pricing models (1990–2010).\n\n\
         Below is the combined analysis of {papers_count} papers, each containing 8 detailed \
         demands (model explanation, formulas, algorithms, code, AI suggestions, datasets, and \
         key findings).\n\n\
         Please write a {} for a comprehensive report. ",
        section.heading().to_lowercase()
    );

    match section {
        NarrativeSection::Introduction => prompt.push_str(&format!(
            "Write a {}-paragraph introduction that sets the context, outlines the importance of \
             pricing models, and previews the content of the report.",
            required(section)
        )),
        NarrativeSection::Discussion => prompt.push_str(
            "Write a discussion section that compares and contrasts the different models, \
             highlights common themes, methodological differences, and implications. Identify \
             any controversies or gaps. Refer to each paper you discuss by its full title.",
        ),
        NarrativeSection::Conclusion => prompt.push_str(&format!(
            "Write a {}-paragraph conclusion that summarizes the main insights, suggests future \
             research directions, and reflects on the evolution of pricing models over the two \
             decades.",
            required(section)
        )),
    }

    prompt.push_str(
        "\n\nReturn plain prose only: no headings, no lists, paragraphs separated by one blank line.",
    );
    prompt.push_str("\n\nHere is the aggregated content from all papers:\n\n");
    prompt.push_str(digest);
    prompt
}

fn required(section: NarrativeSection) -> usize {
    section.required_paragraphs().unwrap_or_default()
}
