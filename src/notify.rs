//! User Notifications
//!
//! Views report outcomes through a [`Notifier`]; the host application
//! decides how to show them.

use tracing::{info, warn};

/// How a notification is styled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationVariant {
    /// The action succeeded
    Success,
    /// The action failed
    Destructive,
}

/// A localized message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: NotificationVariant,
}

impl Notification {
    /// Builds a success notification
    pub fn success(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            variant: NotificationVariant::Success,
        }
    }

    /// Builds a failure notification
    pub fn failure(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            variant: NotificationVariant::Destructive,
        }
    }
}

/// Receives notifications raised by views
pub trait Notifier: Send + Sync {
    /// Shows one notification
    fn notify(&self, notification: Notification);
}

/// Notifier that writes to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.variant {
            NotificationVariant::Success => info!(title = %n.title, "{}", n.description),
            NotificationVariant::Destructive => warn!(title = %n.title, "{}", n.description),
        }
    }
}

/// Localized message texts
pub mod messages {
    use super::Notification;

    pub fn added(entity: &str) -> Notification {
        Notification::success("تمت الإضافة بنجاح", &format!("تم إضافة بيانات {} بنجاح", entity))
    }

    pub fn add_failed() -> Notification {
        Notification::failure("حدث خطأ", "لم يتم إضافة البيانات. يرجى المحاولة مرة أخرى.")
    }

    pub fn updated(entity: &str) -> Notification {
        Notification::success("تم التعديل بنجاح", &format!("تم تعديل بيانات {} بنجاح", entity))
    }

    pub fn update_failed() -> Notification {
        Notification::failure("حدث خطأ", "لم يتم تعديل البيانات. يرجى المحاولة مرة أخرى.")
    }

    pub fn deleted(entity: &str) -> Notification {
        Notification::success("تم الحذف بنجاح", &format!("تم حذف بيانات {} بنجاح", entity))
    }

    pub fn delete_failed() -> Notification {
        Notification::failure("خطأ في الحذف", "لم يتم حذف البيانات، يرجى المحاولة مرة أخرى")
    }

    pub fn load_failed() -> Notification {
        Notification::failure("خطأ في التحميل", "تعذر تحميل البيانات، يرجى المحاولة مرة أخرى")
    }

    pub fn search_failed() -> Notification {
        Notification::failure("خطأ في البحث", "حدث خطأ أثناء البحث، يرجى المحاولة مرة أخرى")
    }

    pub fn report_failed() -> Notification {
        Notification::failure(
            "خطأ في إنشاء التقرير",
            "لم يتم إنشاء التقرير بنجاح، يرجى المحاولة مرة أخرى",
        )
    }

    pub fn report_busy() -> Notification {
        Notification::failure("جاري تحميل تقرير", "يرجى الانتظار حتى يكتمل التحميل الحالي")
    }
}
