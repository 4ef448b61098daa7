//! Everything the voice says, in one place.

pub(crate) const GREETING: &str =
    "Hi, thanks for calling the demo line! First off, what's your name?";

pub(crate) fn ask_code(name: &str) -> String {
    format!("Thanks, {name}! Now read me the four digit code on your screen.")
}

pub(crate) const CODE_RETRY: &str =
    "Hmm, I couldn't match that code. Read me the four digits on your screen one more time?";

pub(crate) const CODE_EXHAUSTED: &str =
    "I still couldn't match that code. Refresh the webpage for a fresh code and call back. Goodbye!";

pub(crate) fn locked_out(wait_minutes: i64) -> String {
    format!(
        "Too many failed attempts from this number. Please wait about {wait_minutes} \
         minutes and try again. Goodbye!"
    )
}

pub(crate) const ASK_VERTICAL: &str =
    "You're paired up — check your screen! Which industry are you in: real estate, \
     insurance, or mortgage?";

pub(crate) const VERTICAL_RETRY: &str =
    "Sorry, which industry was that? Real estate, insurance, mortgage, or something else?";

pub(crate) const ASK_PAIN: &str =
    "Got it. What's the biggest problem with your outbound calls today: spam flags, \
     awkward delays, low answer rates, or speed?";

pub(crate) const PAIN_RETRY: &str =
    "Sorry, was that spam flags, awkward delays, low answer rates, or speed?";

pub(crate) const ASK_PHONE: &str =
    "Last one. What's the best number to call you back on, right now?";

pub(crate) const PHONE_RETRY: &str =
    "Sorry, I didn't get a full phone number. Could you say all ten digits?";

pub(crate) const CALLBACK_COMING: &str =
    "Perfect. Hang up, and we'll ring that number back in a few seconds!";

pub(crate) const RETRIES_EXHAUSTED: &str =
    "Sorry, we're having trouble with this step. Please start over from the webpage. Goodbye!";

pub(crate) fn ask_schedule(name: &str) -> String {
    format!(
        "Hey {name}, this is the callback you asked for — that round trip was the demo! \
         Want me to book a quick call with the team?"
    )
}

pub(crate) fn schedule_confirmed(when: &str) -> String {
    format!("You're booked for {when}. That's the whole demo — thanks for calling!")
}

pub(crate) const SCHEDULE_DECLINED: &str =
    "No problem at all. Thanks for trying the demo — goodbye!";

pub(crate) const GOODBYE: &str = "Thanks for calling the demo line. Goodbye!";
