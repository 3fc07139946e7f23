//! 入站事件 - 后端推送的九类业务事件
//!
//! 事件名与后端约定为 kebab-case 字符串；客户端用穷举枚举建模，
//! 新增事件类型时编译器会强制补齐映射。

use serde::{Deserialize, Serialize};

use super::record::NotificationKind;

/// 传输层原始消息：`{"event": "...", "payload": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub event: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// 事件负载（字段全部可选，缺失时由分发器兜底）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

/// 入站事件类型（与后端事件名一一对应）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InboundEventKind {
    CandidateRequest,
    Application,
    Enrollment,
    ContactForm,
    JobPosting,
    CandidateAdded,
    InterviewScheduled,
    InterviewApprovalNeeded,
    InterviewStatusUpdated,
}

/// 每类事件的展示描述：标题、级别、默认深链接
#[derive(Debug, Clone, Copy)]
pub struct EventDescriptor {
    pub title: &'static str,
    pub kind: NotificationKind,
    pub link: Option<&'static str>,
}

impl InboundEventKind {
    /// 解析后端事件名；未知事件返回 `None`（调用方忽略，不算错误）
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            "candidate-request" => Some(Self::CandidateRequest),
            "application" => Some(Self::Application),
            "enrollment" => Some(Self::Enrollment),
            "contact-form" => Some(Self::ContactForm),
            "job-posting" => Some(Self::JobPosting),
            "candidate-added" => Some(Self::CandidateAdded),
            "interview-scheduled" => Some(Self::InterviewScheduled),
            "interview-approval-needed" => Some(Self::InterviewApprovalNeeded),
            "interview-status-updated" => Some(Self::InterviewStatusUpdated),
            _ => None,
        }
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            Self::CandidateRequest => "candidate-request",
            Self::Application => "application",
            Self::Enrollment => "enrollment",
            Self::ContactForm => "contact-form",
            Self::JobPosting => "job-posting",
            Self::CandidateAdded => "candidate-added",
            Self::InterviewScheduled => "interview-scheduled",
            Self::InterviewApprovalNeeded => "interview-approval-needed",
            Self::InterviewStatusUpdated => "interview-status-updated",
        }
    }

    /// 展示映射表（穷举，漏项无法通过编译）
    pub fn descriptor(&self) -> EventDescriptor {
        match self {
            Self::CandidateRequest => EventDescriptor {
                title: "New candidate request",
                kind: NotificationKind::Info,
                link: Some("/admin/candidate-requests"),
            },
            Self::Application => EventDescriptor {
                title: "New job application",
                kind: NotificationKind::Info,
                link: Some("/admin/applications"),
            },
            Self::Enrollment => EventDescriptor {
                title: "New enrollment",
                kind: NotificationKind::Success,
                link: Some("/admin/enrollments"),
            },
            Self::ContactForm => EventDescriptor {
                title: "Contact form received",
                kind: NotificationKind::Info,
                link: Some("/admin/messages"),
            },
            Self::JobPosting => EventDescriptor {
                title: "New job posting",
                kind: NotificationKind::Info,
                link: Some("/admin/jobs"),
            },
            Self::CandidateAdded => EventDescriptor {
                title: "Candidate added",
                kind: NotificationKind::Success,
                link: Some("/admin/candidates"),
            },
            Self::InterviewScheduled => EventDescriptor {
                title: "Interview scheduled",
                kind: NotificationKind::Info,
                link: Some("/admin/interviews"),
            },
            Self::InterviewApprovalNeeded => EventDescriptor {
                title: "Interview approval needed",
                kind: NotificationKind::Warning,
                link: Some("/admin/interviews"),
            },
            Self::InterviewStatusUpdated => EventDescriptor {
                title: "Interview status updated",
                kind: NotificationKind::Info,
                link: Some("/admin/interviews"),
            },
        }
    }

    /// 全部事件类型（测试与文档用）
    pub const ALL: [InboundEventKind; 9] = [
        Self::CandidateRequest,
        Self::Application,
        Self::Enrollment,
        Self::ContactForm,
        Self::JobPosting,
        Self::CandidateAdded,
        Self::InterviewScheduled,
        Self::InterviewApprovalNeeded,
        Self::InterviewStatusUpdated,
    ];
}
