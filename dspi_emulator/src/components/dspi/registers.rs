//! Register map of the DSP interface.
use super::mmio::Mapping;
use super::mmio::ReadHandler;
use super::mmio::WriteHandler;
use super::Dspi;
use crate::common::dsp_engine::Mailbox;
use crate::common::uint::U32Ext;

/// Register 5000/5002: DSP_MAIL_TO_DSP_HI/LO
pub const DSP_MAIL_TO_DSP_HI: u32 = 0x5000;
pub const DSP_MAIL_TO_DSP_LO: u32 = 0x5002;
/// Register 5004/5006: DSP_MAIL_FROM_DSP_HI/LO
pub const DSP_MAIL_FROM_DSP_HI: u32 = 0x5004;
pub const DSP_MAIL_FROM_DSP_LO: u32 = 0x5006;
/// Register 500A: DSP_CONTROL
pub const DSP_CONTROL: u32 = 0x500A;
/// Register 5012: AR_INFO - ARAM size descriptor
pub const AR_INFO: u32 = 0x5012;
/// Register 5016: AR_MODE - ARAM controller init status, read only
pub const AR_MODE: u32 = 0x5016;
/// Register 501A: AR_REFRESH
pub const AR_REFRESH: u32 = 0x501A;
pub const AR_DMA_MMADDR_H: u32 = 0x5020;
pub const AR_DMA_MMADDR_L: u32 = 0x5022;
pub const AR_DMA_ARADDR_H: u32 = 0x5024;
pub const AR_DMA_ARADDR_L: u32 = 0x5026;
pub const AR_DMA_CNT_H: u32 = 0x5028;
/// Writing this register starts the ARAM DMA.
pub const AR_DMA_CNT_L: u32 = 0x502A;
pub const AUDIO_DMA_START_HI: u32 = 0x5030;
pub const AUDIO_DMA_START_LO: u32 = 0x5032;
/// Legacy block length register, not decoded.
pub const AUDIO_DMA_BLOCKS_LENGTH: u32 = 0x5034;
pub const AUDIO_DMA_CONTROL_LEN: u32 = 0x5036;
pub const AUDIO_DMA_BLOCKS_LEFT: u32 = 0x503A;

pub const WMASK_AR_INFO: u16 = 0x007F;
pub const WMASK_AR_REFRESH: u16 = 0x07FF;
pub const WMASK_AR_HI_RESTRICT: u16 = 0x03FF;
pub const WMASK_AR_CNT_DIR_BIT: u16 = 0x8000;
pub const WMASK_LO_ALIGN_32BIT: u16 = 0xFFE0;

pub(crate) fn build_mapping() -> Mapping<Dspi> {
    let mut mmio = Mapping::new();

    mmio.register(
        DSP_MAIL_TO_DSP_HI,
        ReadHandler::Complex(|d: &mut Dspi| d.read_mailbox_high(Mailbox::CpuToDsp)),
        WriteHandler::Complex(|d: &mut Dspi, _, v| {
            d.dsp_engine.write_mailbox_high(Mailbox::CpuToDsp, v)
        }),
    );
    mmio.register(
        DSP_MAIL_TO_DSP_LO,
        ReadHandler::Complex(|d: &mut Dspi| d.dsp_engine.read_mailbox_low(Mailbox::CpuToDsp)),
        WriteHandler::Complex(|d: &mut Dspi, _, v| {
            d.dsp_engine.write_mailbox_low(Mailbox::CpuToDsp, v)
        }),
    );
    mmio.register(
        DSP_MAIL_FROM_DSP_HI,
        ReadHandler::Complex(|d: &mut Dspi| d.read_mailbox_high(Mailbox::DspToCpu)),
        WriteHandler::Invalid,
    );
    mmio.register(
        DSP_MAIL_FROM_DSP_LO,
        ReadHandler::Complex(|d: &mut Dspi| d.dsp_engine.read_mailbox_low(Mailbox::DspToCpu)),
        WriteHandler::Invalid,
    );

    mmio.register(
        DSP_CONTROL,
        ReadHandler::Complex(|d: &mut Dspi| d.read_control()),
        WriteHandler::Complex(|d: &mut Dspi, bus, v| d.write_control(bus, v)),
    );

    mmio.register(
        AR_INFO,
        ReadHandler::Direct(|d: &Dspi| d.aram_info),
        WriteHandler::Direct {
            set: |d: &mut Dspi, v| d.aram_info = v,
            mask: WMASK_AR_INFO,
        },
    );
    mmio.register(
        AR_MODE,
        ReadHandler::Direct(|d: &Dspi| d.aram_mode),
        WriteHandler::Invalid,
    );
    mmio.register(
        AR_REFRESH,
        ReadHandler::Direct(|d: &Dspi| d.aram_refresh),
        WriteHandler::Direct {
            set: |d: &mut Dspi, v| d.aram_refresh = v,
            mask: WMASK_AR_REFRESH,
        },
    );

    mmio.register(
        AR_DMA_MMADDR_H,
        ReadHandler::Direct(|d: &Dspi| d.aram_dma.mm_addr.high_word()),
        WriteHandler::Direct {
            set: |d: &mut Dspi, v| d.aram_dma.mm_addr = d.aram_dma.mm_addr.with_high_word(v),
            mask: WMASK_AR_HI_RESTRICT,
        },
    );
    mmio.register(
        AR_DMA_MMADDR_L,
        ReadHandler::Direct(|d: &Dspi| d.aram_dma.mm_addr.low_word()),
        WriteHandler::Direct {
            set: |d: &mut Dspi, v| d.aram_dma.mm_addr = d.aram_dma.mm_addr.with_low_word(v),
            mask: WMASK_LO_ALIGN_32BIT,
        },
    );
    mmio.register(
        AR_DMA_ARADDR_H,
        ReadHandler::Direct(|d: &Dspi| d.aram_dma.ar_addr.high_word()),
        WriteHandler::Direct {
            set: |d: &mut Dspi, v| d.aram_dma.ar_addr = d.aram_dma.ar_addr.with_high_word(v),
            mask: WMASK_AR_HI_RESTRICT,
        },
    );
    mmio.register(
        AR_DMA_ARADDR_L,
        ReadHandler::Direct(|d: &Dspi| d.aram_dma.ar_addr.low_word()),
        WriteHandler::Direct {
            set: |d: &mut Dspi, v| d.aram_dma.ar_addr = d.aram_dma.ar_addr.with_low_word(v),
            mask: WMASK_LO_ALIGN_32BIT,
        },
    );
    mmio.register(
        AR_DMA_CNT_H,
        ReadHandler::Direct(|d: &Dspi| d.aram_dma.count_raw().high_word()),
        WriteHandler::Direct {
            set: |d: &mut Dspi, v| d.aram_dma.set_count_high(v),
            mask: WMASK_AR_HI_RESTRICT | WMASK_AR_CNT_DIR_BIT,
        },
    );
    mmio.register(
        AR_DMA_CNT_L,
        ReadHandler::Direct(|d: &Dspi| d.aram_dma.count_raw().low_word()),
        WriteHandler::Complex(|d: &mut Dspi, bus, v| {
            d.aram_dma.set_count_low(v & WMASK_LO_ALIGN_32BIT);
            d.start_aram_dma(bus);
        }),
    );

    mmio.register(
        AUDIO_DMA_START_HI,
        ReadHandler::Direct(|d: &Dspi| d.audio_dma.source_address.high_word()),
        WriteHandler::Complex(|d: &mut Dspi, _, v| {
            let mask = d.config.console.audio_source_high_mask();
            d.audio_dma.set_source_high(v & mask);
        }),
    );
    mmio.register(
        AUDIO_DMA_START_LO,
        ReadHandler::Direct(|d: &Dspi| d.audio_dma.source_address.low_word()),
        WriteHandler::Direct {
            set: |d: &mut Dspi, v| d.audio_dma.set_source_low(v),
            mask: WMASK_LO_ALIGN_32BIT,
        },
    );
    mmio.register(
        AUDIO_DMA_CONTROL_LEN,
        ReadHandler::Direct(|d: &Dspi| u16::from(d.audio_dma.control)),
        WriteHandler::Complex(|d: &mut Dspi, bus, v| d.write_audio_dma_control(bus, v)),
    );
    mmio.register(
        AUDIO_DMA_BLOCKS_LEFT,
        ReadHandler::Direct(|d: &Dspi| d.audio_dma.blocks_left()),
        WriteHandler::Invalid,
    );

    mmio
}
