use crate::menu::config::{
    messages, APPLICATION_ID, PLAY_STORE_URL, SHARE_MESSAGE, SUPPORT_EMAIL, SUPPORT_EMAIL_SUBJECT,
    WHATSAPP_PACKAGE, WHATSAPP_SEND_URL,
};
use crate::menu::platform::{Notifier, UrlLauncher};
use crate::menu::types::LaunchError;

/// `mailto:` link to support with the enquiry subject filled in
pub fn support_email_url() -> String {
    format!(
        "mailto:{}?subject={}",
        SUPPORT_EMAIL,
        urlencoding::encode(SUPPORT_EMAIL_SUBJECT)
    )
}

/// Store listing for this app
pub fn play_store_url() -> String {
    format!("{}{}", PLAY_STORE_URL, APPLICATION_ID)
}

pub fn share_message() -> String {
    format!("{}{}", SHARE_MESSAGE, play_store_url())
}

pub fn whatsapp_share_url() -> String {
    format!("{}{}", WHATSAPP_SEND_URL, urlencoding::encode(&share_message()))
}

/// Open the user's mail app on a pre-filled support email
pub fn email_support(launcher: &dyn UrlLauncher, notifier: &dyn Notifier) -> Result<(), LaunchError> {
    let opened = launcher.open(&support_email_url());
    if let Err(e) = &opened {
        log::error!("Could not open email composer: {}", e);
        notifier.show(messages::ACTION_FAILED);
    }
    opened
}

/// Share the store link through WhatsApp
pub fn share_on_whatsapp(launcher: &dyn UrlLauncher, notifier: &dyn Notifier) -> Result<(), LaunchError> {
    let opened = launcher.open(&whatsapp_share_url());
    match &opened {
        Ok(()) => {}
        Err(LaunchError::NotInstalled(_)) => {
            log::info!("{} is not installed", WHATSAPP_PACKAGE);
            notifier.show(messages::WHATSAPP_MISSING);
        }
        Err(LaunchError::Failed(reason)) => {
            log::error!("Error sharing on WhatsApp: {}", reason);
            notifier.show(messages::ACTION_FAILED);
        }
    }
    opened
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    enum Behaviour {
        Succeed,
        NotInstalled,
        Fail,
    }

    struct FakeLauncher {
        behaviour: Behaviour,
        opened: Mutex<Vec<String>>,
    }

    impl FakeLauncher {
        fn new(behaviour: Behaviour) -> Self {
            Self {
                behaviour,
                opened: Mutex::new(Vec::new()),
            }
        }
    }

    impl UrlLauncher for FakeLauncher {
        fn open(&self, url: &str) -> Result<(), LaunchError> {
            self.opened.lock().unwrap().push(url.to_string());
            match self.behaviour {
                Behaviour::Succeed => Ok(()),
                Behaviour::NotInstalled => Err(LaunchError::NotInstalled(WHATSAPP_PACKAGE.to_string())),
                Behaviour::Fail => Err(LaunchError::Failed("activity not found".to_string())),
            }
        }
    }

    #[derive(Default)]
    struct Toasts(Mutex<Vec<String>>);

    impl Notifier for Toasts {
        fn show(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn test_support_email_url() {
        assert_eq!(
            support_email_url(),
            "mailto:tom@scribbleapps.co.uk?subject=The%20Office%20Trivia%20Quiz%20enquiry"
        );
    }

    #[test]
    fn test_share_message_links_store_listing() {
        assert_eq!(
            share_message(),
            "Play The Office Trivia Quiz on Android!\n\nhttps://play.google.com/store/apps/details?id=uk.co.thomasroe.officequiz"
        );
        assert!(whatsapp_share_url().starts_with("whatsapp://send?text=Play%20The%20Office"));
        assert!(whatsapp_share_url().contains("%0A%0Ahttps%3A%2F%2Fplay.google.com"));
    }

    #[test]
    fn test_share_success_is_silent() {
        let launcher = FakeLauncher::new(Behaviour::Succeed);
        let toasts = Toasts::default();

        assert!(share_on_whatsapp(&launcher, &toasts).is_ok());
        assert_eq!(launcher.opened.lock().unwrap().as_slice(), &[whatsapp_share_url()]);
        assert!(toasts.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_share_without_whatsapp() {
        let toasts = Toasts::default();
        let result = share_on_whatsapp(&FakeLauncher::new(Behaviour::NotInstalled), &toasts);

        assert!(matches!(result, Err(LaunchError::NotInstalled(_))));
        assert_eq!(*toasts.0.lock().unwrap(), vec![messages::WHATSAPP_MISSING]);
    }

    #[test]
    fn test_share_failure() {
        let toasts = Toasts::default();
        let result = share_on_whatsapp(&FakeLauncher::new(Behaviour::Fail), &toasts);

        assert!(matches!(result, Err(LaunchError::Failed(_))));
        assert_eq!(*toasts.0.lock().unwrap(), vec![messages::ACTION_FAILED]);
    }

    #[test]
    fn test_email_opens_mailto() {
        let launcher = FakeLauncher::new(Behaviour::Succeed);
        email_support(&launcher, &Toasts::default()).unwrap();

        assert!(launcher.opened.lock().unwrap()[0].starts_with("mailto:"));
    }
}
