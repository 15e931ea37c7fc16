//! Fixed instruction template for bill analysis.

const PREAMBLE: &str = "You are a financial assistant powered by advanced AI technology. Your task is to analyze the content of a bill and provide financial insights and suggestions for improvement. The bill may include details such as charges, taxes, subtotals, and payment information.

Based on the analysis:
1. Summarize the key financial details, including total charges, taxes, and any other relevant information.
2. Highlight any unusual patterns or potential areas of concern in the bill, such as excessive charges or inconsistencies.
3. Provide actionable recommendations for improving financial efficiency, including budgeting strategies, cost-saving measures, or avoiding unnecessary expenses.

The bill content is as follows:
";

const CLOSING: &str = "

Please respond with a clear and detailed analysis, including your observations, insights, and suggestions for financial improvement. Avoid using JSON or structured formats - just provide plain text.";

/// Embed extracted bill text into the analysis prompt.
pub fn build_prompt(extracted_text: &str) -> String {
    let mut prompt = String::with_capacity(PREAMBLE.len() + extracted_text.len() + CLOSING.len());
    prompt.push_str(PREAMBLE);
    prompt.push_str(extracted_text);
    prompt.push_str(CLOSING);
    prompt
}
