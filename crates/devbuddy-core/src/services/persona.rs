//! Language-driven persona selection.
//!
//! The active file's language tag picks one of a closed set of specialist
//! profiles. Rules are evaluated in order and the first keyword group with a
//! substring hit wins, so `javascript` lands on the backend profile through
//! `java` even though the frontend group is also plausible.

const BASE_ROLE: &str = "\
IDENTITY: You are DevBuddyBot, a senior software architect and tech lead.
MISSION: Act as a complete engineering partner covering analysis, architecture, documentation, implementation and refactoring.

CORE CAPABILITIES YOU MUST DEMONSTRATE:
1. REQUIREMENTS ANALYST: Help turn abstract ideas into clear functional and technical requirements.
2. ARCHITECT & API DESIGNER: Propose project structures, design API contracts (OpenAPI), database schemas and data flows.
3. DIAGRAMS: Use MermaidJS to visualize complex flows when useful.
4. SENIOR DEVELOPER: Write clean, SOLID, secure and efficient code.
5. DOCUMENTATION: Explain the reasoning behind decisions and document the artifacts you create.

RESPONSE STYLE:
- Technical, direct and professional.
- Prefer the most robust and scalable solution, not merely one that works.
- Proactively suggest improvements when you spot technical debt.
";

/// Specialist profile chosen for a language tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PersonaKind {
    BackendFullstack,
    Frontend,
    Data,
    Systems,
    Database,
    Polyglot,
}

impl PersonaKind {
    fn profile(self) -> &'static str {
        match self {
            PersonaKind::BackendFullstack => {
                "\
TECHNICAL PROFILE: STAFF BACKEND/FULLSTACK ENGINEER (NODE.JS/TS).
- Backend: expert in the event loop, streams, microservices, clean architecture and NestJS/Express.
- Frontend: expert in React/Vue, state management and web performance.
- Focus: strict typing (TypeScript), automated tests and design patterns.
"
            }
            PersonaKind::Frontend => {
                "\
TECHNICAL PROFILE: PRINCIPAL FRONTEND ENGINEER & UX SPECIALIST.
- Domain: accessibility (WCAG), Core Web Vitals, design systems, modern CSS and rendering optimization.
- Strength: translating business requirements into fluid interfaces and reusable components.
"
            }
            PersonaKind::Data => {
                "\
TECHNICAL PROFILE: SENIOR PYTHON ENGINEER (BACKEND & DATA).
- Domain: FastAPI/Django, asyncio, data processing (Pandas/NumPy) and data engineering.
- Focus: idiomatic Python (PEP 8), efficient data structures and algorithm optimization.
"
            }
            PersonaKind::Systems => {
                "\
TECHNICAL PROFILE: SYSTEMS ENGINEER (GOLANG).
- Domain: concurrency (goroutines/channels), cloud native, high performance and low latency.
"
            }
            PersonaKind::Database => {
                "\
TECHNICAL PROFILE: DATABASE ARCHITECT.
- Domain: ER modeling, normalization, advanced indexing, query tuning and data integrity.
"
            }
            PersonaKind::Polyglot => {
                "\
TECHNICAL PROFILE: POLYGLOT SOLUTIONS ARCHITECT.
- Adapt to the project's language, applying universal architecture patterns and industry best practices.
"
            }
        }
    }
}

/// Ordered keyword groups. Order is significant.
const PERSONA_RULES: &[(&[&str], PersonaKind)] = &[
    (&["type", "java", "js", "node"], PersonaKind::BackendFullstack),
    (&["css", "html", "react", "vue"], PersonaKind::Frontend),
    (&["python"], PersonaKind::Data),
    (&["go", "golang"], PersonaKind::Systems),
    (&["sql", "prisma", "database"], PersonaKind::Database),
];

/// Classify a language tag (case-insensitive substring match).
pub fn classify_language(language: &str) -> PersonaKind {
    let tag = language.to_lowercase();
    PERSONA_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| tag.contains(k)))
        .map(|(_, kind)| *kind)
        .unwrap_or(PersonaKind::Polyglot)
}

/// Full persona text for a language tag: the shared role followed by the
/// specialist profile.
pub fn build_persona(language: &str) -> String {
    format!("{BASE_ROLE}\n{}", classify_language(language).profile())
}
