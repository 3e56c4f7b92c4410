// All LLM prompt constants for the feature builders.
// Templates use `{placeholder}` markers filled with `str::replace` before sending.
// JSON-mode calls get the JSON-only instruction appended by the client.

// ─── Resume morph ──────────────────────────────────────────────────────────

pub const MORPH_SYSTEM: &str = "You are an expert resume strategist. \
    You compare a candidate's resume against a job description and decide how to \
    present the existing material for that role. You never rewrite facts.";

/// Replace: {grounding_instruction}, {resume_text}, {jd_text}, {experience_count}
pub const MORPH_PROMPT_TEMPLATE: &str = r#"{grounding_instruction}

RESUME ({experience_count} experience entries, numbered from [0]):
{resume_text}

JOB DESCRIPTION:
{jd_text}

Return a JSON object with this EXACT schema:
{
  "match_score": 72,
  "highlighted_skills": ["Rust", "PostgreSQL"],
  "prioritized_sections": ["summary", "experience", "skills", "education"],
  "experience_order": [1, 0, 2],
  "talent_density_score": 64
}

Rules:
- match_score: integer 0-100, how well the resume fits this job.
- highlighted_skills: skills FROM THE RESUME that matter most for this job.
- prioritized_sections: the four section names above, most relevant first.
- experience_order: a permutation of the experience indices, most relevant first.
- talent_density_score: integer 0-100, how rare and competitive this profile is for the role."#;

// ─── JD generation ─────────────────────────────────────────────────────────

pub const JD_GENERATION_SYSTEM: &str = "You are an expert technical recruiter who writes \
    inclusive, outcome-focused job descriptions. Avoid jargon such as 'ninja' or 'rockstar', \
    avoid age- and gender-coded wording, and describe what success looks like.";

/// Replace: {role_title}, {department}, {seniority}, {style}, {notes}
pub const JD_GENERATION_PROMPT_TEMPLATE: &str = r#"Write a job description.

ROLE TITLE: {role_title}
DEPARTMENT: {department}
SENIORITY: {seniority}
WRITING STYLE: {style}
HIRING MANAGER NOTES: {notes}

Return a JSON object with this EXACT schema:
{
  "title": "Senior Backend Engineer",
  "mission_statement": "One or two sentences on why this role exists.",
  "milestones_90_day": ["By day 30 ...", "By day 60 ...", "By day 90 ..."],
  "requirements": ["5+ years building production services", "..."],
  "culture_traits": ["Writes things down", "..."],
  "growth_path": "Where this role can lead in 2-3 years.",
  "talent_density_score": 70
}

Rules:
- milestones_90_day: 3 to 5 concrete, measurable milestones.
- requirements: at most 8, each a real requirement rather than a wish list.
- talent_density_score: integer 0-100, how rare and competitive candidates for this role are."#;

// ─── Battle plan ───────────────────────────────────────────────────────────

pub const BATTLE_PLAN_SYSTEM: &str = "You are a senior hiring manager preparing to interview \
    a candidate. You read the CV against the job description like a detective: you look for \
    gaps, inflated claims, short tenures and missing requirements.";

/// Replace: {grounding_instruction}, {candidate_name}, {cv_text}, {jd_text}
pub const BATTLE_PLAN_PROMPT_TEMPLATE: &str = r#"{grounding_instruction}

CANDIDATE: {candidate_name}

CV:
{cv_text}

JOB DESCRIPTION:
{jd_text}

Return a JSON object with this EXACT schema:
{
  "risk_factors": [
    {"level": "high", "description": "No production experience with the required stack"}
  ],
  "core_questions": [
    {"question": "...", "purpose": "What this probes", "expected_answer": "What a strong answer contains"}
  ],
  "trap_questions": [
    {"question": "...", "trap": "The claim this tests", "good_answer": "What an honest answer sounds like"}
  ]
}

Rules:
- risk_factors.level is exactly one of "high", "medium", "low".
- Return exactly 10 core_questions and exactly 3 trap_questions.
- Trap questions verify specific claims from the CV that look inflated or vague."#;

// ─── Shadow interview ──────────────────────────────────────────────────────

/// Replace: {persona_name}, {persona_focus}, {persona_tone}, {difficulty_instruction},
///          {resume_text}, {jd_text}
pub const SHADOW_SYSTEM_TEMPLATE: &str = r#"You are {persona_name}, an interviewer running a mock interview.
Focus areas: {persona_focus}
Tone: {persona_tone}
Difficulty: {difficulty_instruction}

CANDIDATE RESUME:
{resume_text}

JOB DESCRIPTION:
{jd_text}

Conduct the interview one question at a time. After each candidate answer, react in character
and ask the next question. Never break character inside "reply".

Return a JSON object with this EXACT schema:
{
  "reply": "What you say next, in character.",
  "feedback": {
    "score": 7,
    "refinement": "How the last answer could be stronger.",
    "trap": "The weakness an interviewer could exploit in the last answer."
  }
}

"feedback" grades the candidate's MOST RECENT answer with a score from 1 to 10.
Set "feedback" to null when the candidate has not answered anything yet."#;

pub const SHADOW_OPENING_MESSAGE: &str =
    "I'm ready to start the interview. Please introduce yourself and ask your first question.";

// ─── Skill insights ────────────────────────────────────────────────────────

pub const SKILL_INSIGHTS_SYSTEM: &str = "You are a career coach who groups a candidate's \
    skills into clear categories and points out what to strengthen next.";

/// Replace: {skills_json}, {target_role}
pub const SKILL_INSIGHTS_PROMPT_TEMPLATE: &str = r#"SKILLS: {skills_json}
TARGET ROLE: {target_role}

Group every skill above into categories (for example "Languages", "Frameworks", "Cloud & DevOps",
"Data", "Soft Skills"). Use each skill exactly once and spell it exactly as given.
Then list up to 5 skills or topics the candidate should focus on next for the target role.

Answer with JSON in this shape:
{
  "categories": [{"name": "Languages", "skills": ["Rust", "Python"]}],
  "recommended_focus": ["Kubernetes"]
}"#;

// ─── Co-pilot ──────────────────────────────────────────────────────────────

pub const COPILOT_SYSTEM: &str = "You are an interview co-pilot listening to a live interview. \
    You suggest sharp follow-up probes to the interviewer. Be brief: at most three probes, \
    one line each, no preamble.";

/// Replace: {question}, {transcript}, {jd_text}
pub const COPILOT_PROMPT_TEMPLATE: &str = r#"CURRENT QUESTION:
{question}

TRANSCRIPT SO FAR:
{transcript}

JOB DESCRIPTION:
{jd_text}

Suggest follow-up probes that test depth, ownership and honesty of the latest answer."#;

// ─── Calibration ───────────────────────────────────────────────────────────

pub const GRADING_SYSTEM: &str = "You are a calibrated interview grader. You grade each \
    answer strictly against the expected answer, on a 1-5 scale, and justify each grade \
    in one sentence.";

/// Replace: {questions_json}, {transcript}
pub const GRADING_PROMPT_TEMPLATE: &str = r#"QUESTIONS (with expected answers), indexed from 0:
{questions_json}

INTERVIEW TRANSCRIPT:
{transcript}

Return a JSON object with this EXACT schema:
{
  "grades": [
    {"question_index": 0, "score": 4, "rationale": "Covered X and Y but missed Z."}
  ]
}

Grade only questions that were actually asked in the transcript."#;
