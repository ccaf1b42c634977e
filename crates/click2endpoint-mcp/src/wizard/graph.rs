//! Decision graph: next question, endpoint resolution and progress.
//!
//! `next_question` and `planned_path` are both queries over the single
//! precedence chain in [`walk`], so step counts can never drift from the
//! order questions are actually asked in.

use serde::Serialize;

use super::answers::AnswerSet;
use super::questions::{QuestionId, values};
use crate::endpoints::paths;

#[derive(Debug, Clone, Copy)]
enum Slot<'a> {
    Missing,
    Given(&'a str),
    /// Counted as answered while planning ahead; matches no branch value.
    Assumed,
}

struct View<'a> {
    answers: &'a AnswerSet,
    /// When set, only these questions are visible and unanswered ones are `Assumed`.
    revealed: Option<&'a [QuestionId]>,
}

impl<'a> View<'a> {
    fn slot(&self, id: QuestionId) -> Slot<'a> {
        match self.revealed {
            Some(r) if !r.contains(&id) => Slot::Missing,
            Some(_) => self.answers.get(id).map_or(Slot::Assumed, Slot::Given),
            None => self.answers.get(id).map_or(Slot::Missing, Slot::Given),
        }
    }

    fn unanswered(&self, id: QuestionId) -> bool {
        matches!(self.slot(id), Slot::Missing)
    }

    fn is(&self, id: QuestionId, value: &str) -> bool {
        matches!(self.slot(id), Slot::Given(v) if v == value)
    }
}

fn walk(view: &View<'_>) -> Option<QuestionId> {
    use QuestionId::*;

    if view.unanswered(DocType) {
        return Some(DocType);
    }
    if view.is(DocType, values::PDF_SPLIT) {
        return view.unanswered(RecipientStyle).then_some(RecipientStyle);
    }
    if view.unanswered(TemplateUsage) {
        return Some(TemplateUsage);
    }
    if view.is(TemplateUsage, values::TRUE) && view.unanswered(TemplateContent) {
        return Some(TemplateContent);
    }
    if view.unanswered(RecipientStyle) {
        return Some(RecipientStyle);
    }
    if (view.is(DocType, values::MULTI) || view.is(DocType, values::MERGE))
        && view.unanswered(Personalized)
    {
        return Some(Personalized);
    }
    None
}

/// The next question to ask, or `None` once every required question is answered.
pub fn next_question(answers: &AnswerSet) -> Option<QuestionId> {
    walk(&View {
        answers,
        revealed: None,
    })
}

/// Resolve the endpoint path for an answer set, or `None` when no row matches.
pub fn resolve_endpoint(answers: &AnswerSet) -> Option<&'static str> {
    let doc_type = answers.get(QuestionId::DocType)?;
    if doc_type == values::PDF_SPLIT {
        let style = answers.get(QuestionId::RecipientStyle)?;
        return Some(if style == values::ADDRESS_CAPTURE {
            paths::SINGLE_PDF_SPLIT_ADDRESS_CAPTURE
        } else {
            paths::SINGLE_PDF_SPLIT
        });
    }
    let templated = answers.get(QuestionId::TemplateUsage)? == values::TRUE;
    let path = match (doc_type, templated) {
        (values::SINGLE, true) => paths::SINGLE_DOC_JOB_TEMPLATE,
        (values::SINGLE, false) => paths::SINGLE_DOC,
        (values::MULTI, true) => paths::MULTI_DOCS_JOB_TEMPLATE,
        (values::MULTI, false) => paths::MULTI_DOC,
        (values::MERGE, true) => paths::MULTI_DOC_MERGE_JOB_TEMPLATE,
        (values::MERGE, false) => paths::MULTI_DOC_MERGE,
        _ => return None,
    };
    Some(path)
}

/// Every question the wizard will ask for these answers, in order.
///
/// Answered questions branch on their value; questions not yet answered are
/// assumed answered with a value that takes no optional branch.
pub fn planned_path(answers: &AnswerSet) -> Vec<QuestionId> {
    let mut revealed: Vec<QuestionId> = Vec::with_capacity(QuestionId::ALL.len());
    while let Some(q) = walk(&View {
        answers,
        revealed: Some(&revealed),
    }) {
        revealed.push(q);
    }
    revealed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

pub fn progress(answers: &AnswerSet) -> Progress {
    let path = planned_path(answers);
    Progress {
        current: path.iter().filter(|q| answers.contains(**q)).count(),
        total: path.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use QuestionId::*;

    fn answers(pairs: &[(QuestionId, &str)]) -> AnswerSet {
        pairs.iter().copied().collect()
    }

    #[test]
    fn walks_template_branch_in_order() {
        let mut a = AnswerSet::new();
        assert_eq!(next_question(&a), Some(DocType));
        a.confirm(DocType, "multi");
        assert_eq!(next_question(&a), Some(TemplateUsage));
        a.confirm(TemplateUsage, "true");
        assert_eq!(next_question(&a), Some(TemplateContent));
        a.confirm(TemplateContent, "addressList");
        assert_eq!(next_question(&a), Some(RecipientStyle));
        a.confirm(RecipientStyle, "explicit");
        assert_eq!(next_question(&a), Some(Personalized));
        a.confirm(Personalized, "false");
        assert_eq!(next_question(&a), None);
        assert_eq!(resolve_endpoint(&a), Some("/jobs/multi-docs-job-template"));
    }

    #[test]
    fn pdf_split_only_asks_recipient_style() {
        let a = answers(&[(DocType, "pdfSplit")]);
        assert_eq!(next_question(&a), Some(RecipientStyle));
        let a = answers(&[(DocType, "pdfSplit"), (RecipientStyle, "template")]);
        assert_eq!(next_question(&a), None);
    }

    #[test]
    fn resolves_table_rows() {
        assert_eq!(
            resolve_endpoint(&answers(&[(DocType, "single"), (TemplateUsage, "true")])),
            Some("/jobs/single-doc-job-template")
        );
        assert_eq!(
            resolve_endpoint(&answers(&[(DocType, "single"), (TemplateUsage, "false")])),
            Some("/jobs/single-doc")
        );
        assert_eq!(
            resolve_endpoint(&answers(&[(DocType, "merge"), (TemplateUsage, "false")])),
            Some("/jobs/multi-doc-merge")
        );
        assert_eq!(
            resolve_endpoint(&answers(&[
                (DocType, "pdfSplit"),
                (RecipientStyle, "addressCapture")
            ])),
            Some("/jobs/single-pdf-split-addressCapture")
        );
        assert_eq!(
            resolve_endpoint(&answers(&[(DocType, "pdfSplit"), (RecipientStyle, "explicit")])),
            Some("/jobs/single-pdf-split")
        );
    }

    #[test]
    fn missing_keys_do_not_resolve() {
        assert_eq!(resolve_endpoint(&AnswerSet::new()), None);
        assert_eq!(resolve_endpoint(&answers(&[(DocType, "single")])), None);
        assert_eq!(resolve_endpoint(&answers(&[(DocType, "pdfSplit")])), None);
        assert_eq!(
            resolve_endpoint(&answers(&[(DocType, "fax"), (TemplateUsage, "true")])),
            None
        );
    }

    #[test]
    fn progress_totals_follow_the_chain() {
        assert_eq!(progress(&AnswerSet::new()), Progress { current: 0, total: 3 });
        assert_eq!(progress(&answers(&[(DocType, "pdfSplit")])).total, 2);
        assert_eq!(progress(&answers(&[(DocType, "single")])).total, 3);
        assert_eq!(progress(&answers(&[(DocType, "multi")])).total, 4);
        assert_eq!(progress(&answers(&[(DocType, "merge")])).total, 4);
        let p = progress(&answers(&[(DocType, "merge"), (TemplateUsage, "true")]));
        assert_eq!(p, Progress { current: 2, total: 5 });
        assert_eq!(
            planned_path(&answers(&[(DocType, "single"), (TemplateUsage, "true")])),
            vec![DocType, TemplateUsage, TemplateContent, RecipientStyle]
        );
    }

    #[test]
    fn answers_off_the_path_do_not_count() {
        let a = answers(&[(DocType, "single"), (Personalized, "true")]);
        assert_eq!(progress(&a), Progress { current: 1, total: 3 });
    }

    fn any_answers() -> impl Strategy<Value = AnswerSet> {
        let value = prop_oneof![
            Just("single"),
            Just("multi"),
            Just("merge"),
            Just("pdfSplit"),
            Just("true"),
            Just("false"),
            Just("explicit"),
            Just("template"),
            Just("addressCapture"),
            Just("addressList"),
            Just("document"),
        ];
        let id = prop::sample::select(QuestionId::ALL.to_vec());
        prop::collection::vec((id, value), 0..6).prop_map(|pairs| pairs.into_iter().collect())
    }

    proptest! {
        #[test]
        fn pdf_split_never_asks_template_questions(a in any_answers()) {
            let mut a = a;
            a.confirm(DocType, "pdfSplit");
            let q = next_question(&a);
            prop_assert!(!matches!(q, Some(TemplateUsage | TemplateContent | Personalized)));
        }

        #[test]
        fn single_never_asks_personalization(a in any_answers()) {
            let mut a = a;
            a.confirm(DocType, "single");
            prop_assert_ne!(next_question(&a), Some(Personalized));
        }

        #[test]
        fn next_question_is_the_first_unanswered_step(a in any_answers()) {
            let path = planned_path(&a);
            let first_open = path.iter().copied().find(|q| !a.contains(*q));
            prop_assert_eq!(next_question(&a), first_open);
            let p = progress(&a);
            prop_assert!(p.current <= p.total);
        }
    }
}
