use crate::models::section::{ResumeInput, SectionContent};
use crate::render::section::{escape, render_links, render_section};

const STYLE: &str = "\
body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 2rem; color: #222; }
h1 { margin-bottom: 0.25rem; }
h2 { border-bottom: 1px solid #ddd; padding-bottom: 0.2rem; }
h3 { margin: 0.75rem 0 0.1rem; font-size: 1.05rem; }
.section { margin-top: 1.5rem; }
.item { margin-bottom: 0.75rem; }
.meta { color: #555; margin: 0 0 0.25rem; font-size: 0.9rem; }
dl { display: grid; grid-template-columns: max-content auto; gap: 0.2rem 1rem; }
dt { font-weight: 600; }
dd { margin: 0; }
pre { white-space: pre-wrap; margin: 0; }
a { color: #1a4f9c; }";

/// Renders every section of `input` in the fixed resume order.
pub fn render_sections(input: &ResumeInput) -> String {
    let about = SectionContent::from(input.description.as_str());
    let sections: [(&str, Option<&SectionContent>); 8] = [
        ("About", Some(&about)),
        ("Objective", input.objective.as_ref()),
        ("Technical Skills", input.technical_skills.as_ref()),
        ("Experience", input.experience.as_ref()),
        ("Education", input.education.as_ref()),
        ("Certification", input.certification.as_ref()),
        ("Courses", input.courses.as_ref()),
        ("Languages", input.languages.as_ref()),
    ];

    let mut html: String = sections
        .iter()
        .map(|(title, content)| render_section(title, *content))
        .collect();
    html.push_str(&render_links("Links", input.links.as_ref()));
    html
}

/// Renders the complete, self-contained HTML document sent to the PDF renderer.
pub fn render_document(input: &ResumeInput) -> String {
    let name = escape(input.name.trim());
    format!(
        "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n<title>{name}</title>\n\
         <style>\n{STYLE}\n</style>\n</head>\n<body>\n<h1>{name}</h1>\n{}\n</body>\n</html>\n",
        render_sections(input)
    )
}
