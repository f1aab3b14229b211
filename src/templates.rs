use chrono::{Days, NaiveDate};

use crate::models::{
    member::ReminderType,
    queue::{PaymentDetails, SeatType, WelcomeDetails},
};

/// Calendar days between joining and the first due date.
pub const DUE_PERIOD_DAYS: u64 = 30;

const POLICY_TEXT: &str = "Any indiscipline will lead to cancellation of your admission without any refund.\n\nThe fees is non refundable in any situation.\n\nNote:- 200rs security only refundable in case if you’re leaving the library and texting on WhatsApp 15 days before your due date, and it will adjustable if you went to vacation without any information and with information post your due date it will be adjustable and you have to pay again whenever you join again.\n\nOnce you take the security refund you have to pay registration and security fees again whenever you join again.";

const RESTRICTIONS_TEXT: &str =
    "\n\nRestrictions between 12pm-4:30pm( You can’t come and sit at this time)";

/// Fixed en-GB long form: zero-padded day, full month name, 4-digit year.
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%d %B %Y").to_string()
}

fn seat_description(plan_name: &str, seat_type: Option<SeatType>) -> &'static str {
    let plan = plan_name.to_lowercase();

    if plan.contains("3hrs") {
        "3hrs Random Seat"
    } else if plan.contains("6hrs") {
        if plan.contains("unrestricted") {
            "6hrs Random Seat (No Restrictions)"
        } else {
            "6hrs Random Seat"
        }
    } else if plan.contains("corner") {
        "Corner Fixed Seat"
    } else if seat_type == Some(SeatType::Fixed) {
        "Fixed Seat"
    } else {
        "24hrs Random Seat"
    }
}

pub fn welcome_message(details: &WelcomeDetails) -> String {
    let due_date = details.joining_date + Days::new(DUE_PERIOD_DAYS);
    let formatted_due_date = format_long_date(due_date);

    let line1 = format!(
        "Thanks for Joining The Expert’s Hub Library Munirka New Delhi. Received your fees for {}.\nyour next due date is on {}.",
        details.plan_name, formatted_due_date
    );

    let seat = seat_description(&details.plan_name, details.seat_type);
    let mut fee_lines = vec![format!("{}-{}rs", seat, details.membership_amount)];

    if details.registration_fee > 0 {
        fee_lines.push(format!("Registration fees-{}rs", details.registration_fee));
    }

    if details.security_fee > 0 {
        fee_lines.push(format!(
            "Security fees-{}rs(refundable) only if you text 15 days before your due date that you are leaving the library",
            details.security_fee
        ));
    }

    let restrictions = if details.access_restriction {
        RESTRICTIONS_TEXT
    } else {
        ""
    };

    format!(
        "{}\n\n{}\n\n{}{}",
        line1,
        fee_lines.join("\n"),
        POLICY_TEXT,
        restrictions
    )
}

pub fn payment_confirmation_message(member_name: &str, details: &PaymentDetails) -> String {
    format!(
        "✅ Payment Confirmation\nHello {},\n\nYour payment of ₹{} has been successfully submitted.\n\nYour next due date is {}.\n\nThank you,\nThe Expert Hub Library",
        member_name,
        details.amount,
        format_long_date(details.next_due_date)
    )
}

pub fn expiring_soon_message(member_name: &str, expiry_date: NaiveDate, amount: u32) -> String {
    format!(
        "📚 The Expert Hub Library\nHello {},\n\nThis is a reminder that your library membership will expire on {}.\n\n💰 Membership Fee: ₹{}\n\nPlease renew on time to avoid any interruption in services.\n\n— The Expert Hub Library Team",
        member_name,
        format_long_date(expiry_date),
        amount
    )
}

pub fn expiring_today_message(member_name: &str, amount: u32) -> String {
    format!(
        "⚠️ The Expert Hub Library – Important\nHello {},\n\nYour library membership is expiring today.\n\n💰 Renewal Fee: ₹{}\n\nKindly renew today to continue uninterrupted access.\n\nThank you,\nThe Expert Hub Library",
        member_name, amount
    )
}

pub fn expired_message(member_name: &str, expiry_date: NaiveDate, amount: u32) -> String {
    format!(
        "❌ The Expert Hub Library\nHello {},\n\nYour library membership expired on {}.\n\n💰 Pending Renewal Fee: ₹{}\n\nPlease note that services will remain inactive until renewal is completed.\n\nFor renewal, contact the library office.\n\n— The Expert Hub Library",
        member_name,
        format_long_date(expiry_date),
        amount
    )
}

pub fn reminder_message(
    kind: ReminderType,
    member_name: &str,
    amount: u32,
    expiry_date: NaiveDate,
) -> String {
    match kind {
        ReminderType::Expiring7Days => expiring_soon_message(member_name, expiry_date, amount),
        ReminderType::ExpiringToday => expiring_today_message(member_name, amount),
        ReminderType::Expired1Day => expired_message(member_name, expiry_date, amount),
    }
}
