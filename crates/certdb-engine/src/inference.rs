//! Never-empty fallback generator.
//!
//! Four resolvers run in priority order over declarative template tables;
//! the first one that applies wins and nothing is merged. The last resolver
//! always applies, so every call yields at least one objective.

use serde::Serialize;

use certdb_core::drafts::{NewObjective, NewTest};
use certdb_core::enums::InferenceStrategy;

const INTASC_URL: &str = "https://ccsso.org/intasc";

/// Subject area (matched case-insensitively) to ordered objective texts.
pub const SUBJECT_TEMPLATES: &[(&str, &[&str])] = &[
    (
        "Elementary Education",
        &[
            "Demonstrate knowledge of child development and learning theory",
            "Apply effective instructional strategies for diverse learners",
            "Integrate literacy instruction across content areas",
            "Use formative and summative assessment to guide instruction",
            "Create inclusive and culturally responsive classroom environments",
            "Understand and teach mathematics concepts and problem-solving",
            "Implement science inquiry and investigation methods",
            "Teach social studies content and citizenship concepts",
            "Develop students' critical thinking and communication skills",
        ],
    ),
    (
        "Mathematics",
        &[
            "Demonstrate deep understanding of mathematical concepts and procedures",
            "Apply mathematical reasoning and problem-solving strategies",
            "Connect and apply mathematics to real-world problems and other disciplines",
            "Use technology to enhance mathematical learning",
            "Assess student understanding of mathematical concepts",
            "Differentiate instruction and plan for diverse mathematical learners",
            "Teach number sense, operations, and algebraic thinking",
            "Develop geometric and spatial reasoning in students",
            "Apply statistical and probabilistic reasoning to data",
        ],
    ),
    (
        "English Language Arts",
        &[
            "Demonstrate knowledge of reading processes and comprehension strategies",
            "Teach writing processes and composition across genres",
            "Develop students' speaking and listening skills",
            "Analyze and teach literary and informational texts",
            "Apply linguistics and language development principles",
            "Integrate technology and media literacy instruction",
            "Assess and support literacy development in students",
            "Differentiate instruction and plan for diverse language learners",
        ],
    ),
    (
        "Science",
        &[
            "Apply scientific inquiry and investigation methods",
            "Demonstrate content knowledge in physical sciences",
            "Demonstrate content knowledge in life sciences",
            "Demonstrate content knowledge in earth and space sciences",
            "Use technology and laboratory equipment safely and effectively",
            "Connect and integrate science concepts across disciplines",
            "Develop students' scientific reasoning and critical thinking",
            "Assess student understanding of scientific concepts",
        ],
    ),
    (
        "Social Studies",
        &[
            "Teach historical thinking and chronological reasoning",
            "Develop students' geographic literacy and spatial thinking",
            "Apply civic knowledge and promote civic engagement",
            "Teach economic concepts and financial literacy",
            "Integrate primary and secondary source analysis",
            "Promote cultural awareness and teach global perspectives",
            "Use inquiry-based approaches to social studies instruction",
        ],
    ),
    (
        "Special Education",
        &[
            "Understand characteristics of students with disabilities",
            "Apply individualized education program (IEP) development and implementation",
            "Use evidence-based instructional strategies for diverse learners",
            "Implement positive behavior supports and interventions",
            "Collaborate with families, educators, and service providers",
            "Apply assessment for eligibility, progress monitoring, and instruction",
            "Ensure students can access and use the general education curriculum",
            "Understand legal and ethical responsibilities in special education",
        ],
    ),
];

/// InTASC Model Core Teaching Standards.
pub const NATIONAL_STANDARDS: &[&str] = &[
    "Learner Development: Understands how learners grow and develop",
    "Learning Differences: Uses understanding of individual differences and diverse cultures",
    "Learning Environments: Works with others to create environments that support learning",
    "Content Knowledge: Understands the central concepts and tools of inquiry",
    "Application of Content: Connects concepts and uses differing perspectives",
    "Assessment: Understands and uses multiple methods of assessment",
    "Planning for Instruction: Plans instruction that supports every student",
    "Instructional Strategies: Understands and uses a variety of instructional strategies",
    "Professional Learning: Engages in ongoing learning and evaluates own practice",
    "Leadership and Collaboration: Seeks leadership roles and collaborates",
];

/// Number of national standards used by the minimal fallback.
const MINIMAL_STANDARDS: usize = 5;

/// Test-system patterns; `{topic}` is the test name (or the system when the
/// name is blank).
pub const SYSTEM_PATTERNS: &[&str] = &[
    "Demonstrate content knowledge assessed by {topic}",
    "Apply pedagogical principles and instructional strategies",
    "Assess and evaluate student learning and progress",
    "Create inclusive and equitable learning environments",
    "Integrate technology and resources to enhance learning",
    "Collaborate with colleagues, families, and communities",
    "Engage in professional growth and demonstrate ethical practice",
];

const PRAXIS_PATTERN: &str = "Apply Educational Testing Service (ETS) standards for teacher readiness";
const NES_PATTERN: &str = "Demonstrate mastery of state-specific educator preparation standards";

/// Keywords in a test name that select the national standards.
const GENERAL_LICENSE_KEYWORDS: &[&str] = &["elementary", "general"];

/// What the generator is told about a test.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationContext<'a> {
    pub subject_area: &'a str,
    pub test_system: &'a str,
    pub test_name: &'a str,
}

impl<'a> From<&'a NewTest> for GenerationContext<'a> {
    fn from(test: &'a NewTest) -> Self {
        Self {
            subject_area: &test.subject_area,
            test_system: &test.test_system,
            test_name: &test.test_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedObjective {
    pub text: String,
    pub confidence: f64,
    pub rationale: String,
    pub evidence_url: Option<String>,
}

/// The winning strategy and its ordered objectives. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generation {
    pub strategy: InferenceStrategy,
    pub objectives: Vec<GeneratedObjective>,
}

impl Generation {
    /// Convert into insert drafts indexed from zero.
    #[must_use]
    pub fn into_drafts(self) -> Vec<NewObjective> {
        self.objectives
            .into_iter()
            .zip(0u32..)
            .map(|(objective, index)| {
                let mut draft = NewObjective::inferred(
                    index,
                    &objective.text,
                    objective.confidence,
                    &objective.rationale,
                );
                draft.evidence_url = objective.evidence_url;
                draft
            })
            .collect()
    }

    /// Raise confidence by 0.1 per supporting source (at most +0.3, capped at
    /// 1.0) and note the source count in each rationale.
    pub fn apply_evidence_boost(&mut self, supporting_sources: usize) {
        if supporting_sources == 0 {
            return;
        }
        let boost = f64::from(u32::try_from(supporting_sources.min(3)).unwrap_or(3)) * 0.1;
        for objective in &mut self.objectives {
            objective.confidence = (objective.confidence + boost).min(1.0);
            objective
                .rationale
                .push_str(&format!(" | Supported by {supporting_sources} additional source(s)"));
        }
    }
}

type Resolver = fn(&GenerationContext<'_>) -> Option<Vec<GeneratedObjective>>;

/// Resolvers in priority order. The last one always applies.
const CASCADE: [(InferenceStrategy, Resolver); 4] = [
    (InferenceStrategy::SubjectTemplate, subject_template),
    (InferenceStrategy::NationalStandards, national_standards),
    (InferenceStrategy::TestSystemPattern, test_system_pattern),
    (InferenceStrategy::MinimalFallback, minimal_fallback),
];

/// Run the cascade with no confidence floor.
#[must_use]
pub fn generate(ctx: &GenerationContext<'_>) -> Generation {
    generate_with_floor(ctx, 0.0)
}

/// Run the cascade, dropping objectives below `floor`. A strategy left with
/// nothing after the floor is skipped; the last strategy is returned
/// unfiltered if the floor would empty it.
#[must_use]
pub fn generate_with_floor(ctx: &GenerationContext<'_>, floor: f64) -> Generation {
    let mut fallback = None;
    for (strategy, resolve) in CASCADE {
        let Some(objectives) = resolve(ctx) else {
            continue;
        };
        let kept: Vec<_> = objectives
            .iter()
            .filter(|o| o.confidence >= floor)
            .cloned()
            .collect();
        if !kept.is_empty() {
            return Generation {
                strategy,
                objectives: kept,
            };
        }
        tracing::debug!(%strategy, floor, "strategy fell below confidence floor");
        fallback = Some(Generation {
            strategy,
            objectives,
        });
    }
    // The minimal fallback always resolves, so `fallback` is set here.
    fallback.unwrap_or_else(|| Generation {
        strategy: InferenceStrategy::MinimalFallback,
        objectives: minimal_objectives(),
    })
}

fn from_texts<'t>(
    texts: impl IntoIterator<Item = &'t str>,
    strategy: InferenceStrategy,
    rationale: &str,
    evidence_url: Option<&str>,
) -> Vec<GeneratedObjective> {
    texts
        .into_iter()
        .map(|text| GeneratedObjective {
            text: text.to_string(),
            confidence: strategy.confidence(),
            rationale: rationale.to_string(),
            evidence_url: evidence_url.map(String::from),
        })
        .collect()
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn subject_template(ctx: &GenerationContext<'_>) -> Option<Vec<GeneratedObjective>> {
    let subject = ctx.subject_area.trim();
    let (name, texts) = SUBJECT_TEMPLATES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(subject))?;
    Some(from_texts(
        texts.iter().copied(),
        InferenceStrategy::SubjectTemplate,
        &format!("Inferred from standard {name} teacher certification competency frameworks"),
        None,
    ))
}

fn national_standards(ctx: &GenerationContext<'_>) -> Option<Vec<GeneratedObjective>> {
    let applies = GENERAL_LICENSE_KEYWORDS
        .iter()
        .any(|kw| contains_ignore_case(ctx.test_name, kw));
    applies.then(|| {
        from_texts(
            NATIONAL_STANDARDS.iter().copied(),
            InferenceStrategy::NationalStandards,
            "Inferred from InTASC Model Core Teaching Standards, applicable to general teaching licenses",
            Some(INTASC_URL),
        )
    })
}

fn test_system_pattern(ctx: &GenerationContext<'_>) -> Option<Vec<GeneratedObjective>> {
    let system = ctx.test_system.trim();
    if system.is_empty() {
        return None;
    }
    let topic = if ctx.test_name.trim().is_empty() {
        system
    } else {
        ctx.test_name.trim()
    };

    let mut texts: Vec<String> = SYSTEM_PATTERNS
        .iter()
        .map(|p| p.replace("{topic}", topic))
        .collect();
    if contains_ignore_case(system, "praxis") {
        texts.push(PRAXIS_PATTERN.to_string());
    } else if system
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| word.eq_ignore_ascii_case("nes"))
    {
        texts.push(NES_PATTERN.to_string());
    }

    Some(from_texts(
        texts.iter().map(String::as_str),
        InferenceStrategy::TestSystemPattern,
        &format!("Inferred from known patterns for {system} and common teacher competencies"),
        None,
    ))
}

fn minimal_fallback(_ctx: &GenerationContext<'_>) -> Option<Vec<GeneratedObjective>> {
    Some(minimal_objectives())
}

fn minimal_objectives() -> Vec<GeneratedObjective> {
    from_texts(
        NATIONAL_STANDARDS.iter().take(MINIMAL_STANDARDS).copied(),
        InferenceStrategy::MinimalFallback,
        "minimal fallback; manual review recommended",
        Some(INTASC_URL),
    )
}
